//! Package types and their physical categories.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Physical family a package type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PackageCategory {
    /// Rigid boxes.
    HardBox,
    /// Pallets and pallet-like bases.
    Pallet,
    /// Deformable cartons.
    SoftBox,
    /// Gap fillers that may go anywhere.
    Filler,
}

/// Concrete package type.
///
/// The declaration order is significant: containers report the minimal
/// package type of their contents, and layer ordering sorts by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PackageType {
    /// Heavy duty corrugated board on pedals.
    DutyCorrugatedBoardPedal,
    /// Wooden crate.
    WoodenContainer,
    /// Honeycomb board box.
    HoneycombBox,
    /// Pallet.
    Pallet,
    /// Carton mounted on a pallet.
    CartonPallet,
    /// Plain carton.
    CartonContainer,
    /// Packing foam.
    PackingFoam,
}

impl PackageType {
    /// All package types in declaration order.
    pub const ALL: [PackageType; 7] = [
        PackageType::DutyCorrugatedBoardPedal,
        PackageType::WoodenContainer,
        PackageType::HoneycombBox,
        PackageType::Pallet,
        PackageType::CartonPallet,
        PackageType::CartonContainer,
        PackageType::PackingFoam,
    ];

    /// Returns the physical category.
    pub fn category(self) -> PackageCategory {
        match self {
            PackageType::DutyCorrugatedBoardPedal
            | PackageType::WoodenContainer
            | PackageType::HoneycombBox => PackageCategory::HardBox,
            PackageType::Pallet | PackageType::CartonPallet => PackageCategory::Pallet,
            PackageType::CartonContainer => PackageCategory::SoftBox,
            PackageType::PackingFoam => PackageCategory::Filler,
        }
    }

    /// Returns true for filler material.
    pub fn is_filler(self) -> bool {
        self.category() == PackageCategory::Filler
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PackageType::DutyCorrugatedBoardPedal => "duty corrugated board pedal",
            PackageType::WoodenContainer => "wooden container",
            PackageType::HoneycombBox => "honeycomb box",
            PackageType::Pallet => "pallet",
            PackageType::CartonPallet => "carton pallet",
            PackageType::CartonContainer => "carton container",
            PackageType::PackingFoam => "packing foam",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_order_is_minimal_order() {
        let min = [PackageType::CartonContainer, PackageType::Pallet, PackageType::PackingFoam]
            .into_iter()
            .min();
        assert_eq!(min, Some(PackageType::Pallet));
        assert!(PackageType::DutyCorrugatedBoardPedal < PackageType::PackingFoam);
    }

    #[test]
    fn test_categories() {
        assert_eq!(PackageType::HoneycombBox.category(), PackageCategory::HardBox);
        assert_eq!(PackageType::CartonPallet.category(), PackageCategory::Pallet);
        assert_eq!(PackageType::CartonContainer.category(), PackageCategory::SoftBox);
        assert!(PackageType::PackingFoam.is_filler());
        assert_eq!(
            PackageType::ALL.iter().filter(|t| t.category() == PackageCategory::HardBox).count(),
            3
        );
    }
}
