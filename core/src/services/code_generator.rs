//! Code generation for issued tokens
//!
//! Codes are drawn from the operating system CSPRNG with uniform range
//! sampling, so every symbol of the alphabet is equally likely.

use rand::{rngs::OsRng, Rng};

use otp_shared::config::CodeAlphabet;

const DIGITS: &[u8] = b"0123456789";

/// Upper-case letters and digits without `0 O 1 I`
const UNAMBIGUOUS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Produces the short opaque string handed to the user
pub trait CodeGenerator: Send + Sync {
    /// Generate a new code; uniqueness is not guaranteed
    fn generate(&self) -> String;
}

fn sample(alphabet: &[u8], length: usize) -> String {
    let mut rng = OsRng;
    (0..length)
        .map(|_| char::from(alphabet[rng.gen_range(0..alphabet.len())]))
        .collect()
}

/// Decimal codes, leading zeros kept (`"000417"`)
#[derive(Debug, Clone, Copy)]
pub struct NumericCodeGenerator {
    length: usize,
}

impl NumericCodeGenerator {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Default for NumericCodeGenerator {
    fn default() -> Self {
        Self::new(otp_shared::config::otp::DEFAULT_CODE_LENGTH)
    }
}

impl CodeGenerator for NumericCodeGenerator {
    fn generate(&self) -> String {
        sample(DIGITS, self.length)
    }
}

/// Mixed letter/digit codes for channels where users type by hand
#[derive(Debug, Clone, Copy)]
pub struct AlphanumericCodeGenerator {
    length: usize,
}

impl AlphanumericCodeGenerator {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl CodeGenerator for AlphanumericCodeGenerator {
    fn generate(&self) -> String {
        sample(UNAMBIGUOUS, self.length)
    }
}

/// Build the generator matching a configured alphabet and length
pub fn from_config(alphabet: CodeAlphabet, length: usize) -> Box<dyn CodeGenerator> {
    match alphabet {
        CodeAlphabet::Numeric => Box::new(NumericCodeGenerator::new(length)),
        CodeAlphabet::Alphanumeric => Box::new(AlphanumericCodeGenerator::new(length)),
    }
}
