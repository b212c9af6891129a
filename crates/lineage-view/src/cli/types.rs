//! CLI value enums and their conversions to engine types.

use clap::ValueEnum;
use lineage_graph::LayoutMode;

/// Layout algorithm for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutArg {
    /// Layered, left to right
    #[value(name = "layered-lr", alias = "lr")]
    LayeredLr,
    /// Layered, top to bottom
    #[value(name = "layered-tb", alias = "tb")]
    LayeredTb,
    /// Nodes on a circle
    Circular,
}

impl From<LayoutArg> for LayoutMode {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::LayeredLr => LayoutMode::LayeredLr,
            LayoutArg::LayeredTb => LayoutMode::LayeredTb,
            LayoutArg::Circular => LayoutMode::Circular,
        }
    }
}

impl std::fmt::Display for LayoutArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LayeredLr => write!(f, "layered-lr"),
            Self::LayeredTb => write!(f, "layered-tb"),
            Self::Circular => write!(f, "circular"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(LayoutArg::LayeredLr, LayoutMode::LayeredLr)]
    #[case(LayoutArg::LayeredTb, LayoutMode::LayeredTb)]
    #[case(LayoutArg::Circular, LayoutMode::Circular)]
    fn layout_arg_converts(#[case] arg: LayoutArg, #[case] expected: LayoutMode) {
        assert_eq!(LayoutMode::from(arg), expected);
    }

    #[test]
    fn display_matches_value_name() {
        for arg in LayoutArg::value_variants() {
            let parsed = LayoutArg::from_str(&arg.to_string(), false).unwrap();
            assert_eq!(&parsed, arg);
        }
    }
}
