use crate::capture::Encapsulation;

/// Output encapsulation, chosen from the encapsulations declared by the inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncapsulationResolution {
    pub encapsulation: Encapsulation,
    /// When inputs disagree: index of the first input (0) and of the first input declaring a
    /// different encapsulation
    pub conflict: Option<(usize, usize)>,
}

/// Pick the output encapsulation
///
/// If all inputs declare the same encapsulation, it is used for the output. Otherwise each
/// record is written with its own link type.
pub fn resolve_encapsulation(declared: &[Encapsulation]) -> EncapsulationResolution {
    let first = match declared.first() {
        Some(&e) => e,
        None => {
            return EncapsulationResolution {
                encapsulation: Encapsulation::Unknown,
                conflict: None,
            }
        }
    };
    match declared.iter().position(|&e| e != first) {
        Some(other) => EncapsulationResolution {
            encapsulation: Encapsulation::PerRecord,
            conflict: Some((0, other)),
        },
        None => EncapsulationResolution {
            encapsulation: first,
            conflict: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linktype::Linktype;

    const ETH: Encapsulation = Encapsulation::Link(Linktype::ETHERNET);
    const RAW: Encapsulation = Encapsulation::Link(Linktype::RAW);

    #[test]
    fn identical() {
        let r = resolve_encapsulation(&[ETH, ETH, ETH]);
        assert_eq!(r.encapsulation, ETH);
        assert_eq!(r.conflict, None);
        // a single input with several link types stays per-record, without conflict
        let r = resolve_encapsulation(&[Encapsulation::PerRecord]);
        assert_eq!(r.encapsulation, Encapsulation::PerRecord);
        assert_eq!(r.conflict, None);
    }

    #[test]
    fn first_difference_is_reported() {
        let r = resolve_encapsulation(&[ETH, ETH, RAW, Encapsulation::Unknown]);
        assert_eq!(r.encapsulation, Encapsulation::PerRecord);
        assert_eq!(r.conflict, Some((0, 2)));
        let r = resolve_encapsulation(&[ETH, Encapsulation::Unknown]);
        assert_eq!(r.conflict, Some((0, 1)));
    }

    #[test]
    fn no_inputs() {
        assert_eq!(
            resolve_encapsulation(&[]).encapsulation,
            Encapsulation::Unknown
        );
    }
}
