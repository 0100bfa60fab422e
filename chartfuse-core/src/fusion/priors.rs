//! Default class priors
//!
//! Prior probability that a detection of each class is a real pattern,
//! estimated from labelled chart sessions. Classic reversal patterns are
//! frequent and distinctive; triple formations and rounding bottoms are
//! rare and easily confused with noise.

use crate::constants::fusion::DEFAULT_CLASS_PRIOR;
use crate::pattern::{ClassTable, PatternClass};

/// Prior table used by the default fusion config
pub fn default_priors() -> ClassTable<f32> {
    ClassTable::new(DEFAULT_CLASS_PRIOR)
        .with(PatternClass::HeadAndShoulders, 0.75)
        .with(PatternClass::DoubleTop, 0.70)
        .with(PatternClass::DoubleBottom, 0.70)
        .with(PatternClass::Triangle, 0.65)
        .with(PatternClass::Flag, 0.60)
        .with(PatternClass::Pennant, 0.60)
        .with(PatternClass::CupAndHandle, 0.55)
        .with(PatternClass::Wedge, 0.55)
        .with(PatternClass::Channel, 0.50)
        .with(PatternClass::TripleTop, 0.40)
        .with(PatternClass::TripleBottom, 0.40)
        .with(PatternClass::RoundingBottom, 0.35)
}
