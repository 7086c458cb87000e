//! UCI option declarations, as advertised in response to `uci`.

use std::fmt::Display;

#[derive(Debug, Clone)]
pub enum OptionType {
    Check { default: bool },
    Spin { min: i32, max: i32, default: i32 },
    Button,
}

impl Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Check { default } => {
                write!(f, "type check default {default}")
            }

            Self::Spin { min, max, default } => {
                write!(f, "type spin default {default} min {min} max {max}")
            }

            Self::Button => {
                write!(f, "type button")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct UciOption {
    pub name: &'static str,
    pub option_type: OptionType,
}

impl Display for UciOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "name {} {}", self.name, self.option_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatting() {
        let option = UciOption {
            name: "Hash",
            option_type: OptionType::Spin { min: 1, max: 1024, default: 64 },
        };

        assert_eq!(option.to_string(), "name Hash type spin default 64 min 1 max 1024");
    }
}
