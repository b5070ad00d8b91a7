//! CSS selector specificity calculation.
//! Spec: <https://www.w3.org/TR/selectors-4/#specificity-rules>

use crate::{ComplexSelector, CompoundSelector, PseudoClass, SimpleSelector};

/// Specificity triple (a, b, c).
/// Spec: Section 17 — Calculating a selector's specificity
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Specificity(pub u16, pub u16, pub u16);

impl Specificity {
    fn combine(self, other: Self) -> Self {
        Self(
            self.0.saturating_add(other.0),
            self.1.saturating_add(other.1),
            self.2.saturating_add(other.2),
        )
    }
}

/// Compute the specificity of a compound selector.
/// `:not()` contributes the specificity of its most specific argument.
pub fn specificity_of_compound(compound: &CompoundSelector) -> Specificity {
    let mut total = Specificity::default();
    for simple in &compound.simples {
        let part = match simple {
            SimpleSelector::IdSelector(_) => Specificity(1, 0, 0),
            SimpleSelector::Class(_) | SimpleSelector::Attribute { .. } => Specificity(0, 1, 0),
            SimpleSelector::PseudoClass(PseudoClass::Not(arguments)) => arguments
                .iter()
                .map(specificity_of_compound)
                .max()
                .unwrap_or_default(),
            SimpleSelector::PseudoClass(_) => Specificity(0, 1, 0),
            SimpleSelector::Type(_) | SimpleSelector::PseudoElement(_) => Specificity(0, 0, 1),
            SimpleSelector::Universal => Specificity::default(),
        };
        total = total.combine(part);
    }
    total
}

/// Compute the specificity of a complex selector (sum of its compounds).
pub fn specificity_of_complex(sel: &ComplexSelector) -> Specificity {
    sel.rest
        .iter()
        .fold(specificity_of_compound(&sel.first), |acc, pair| {
            acc.combine(specificity_of_compound(&pair.1))
        })
}
