use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};

pub type Width = u64;

/// Reduces `value` modulo `2^width`.
pub fn mask(value: BigUint, width: Width) -> BigUint {
    if value.bits() <= width {
        value
    } else {
        let modulus = BigUint::one() << width;
        value & (modulus - BigUint::one())
    }
}

/// An unsigned bit-vector of arbitrary width.
///
/// The payload is always less than `2^width`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Value {
    width: Width,
    value: BigUint,
}

impl Value {
    pub fn new(width: Width, value: BigUint) -> Value {
        Value {
            width,
            value: mask(value, width),
        }
    }

    pub fn from_u64(width: Width, n: u64) -> Value {
        Value::new(width, BigUint::from(n))
    }

    pub fn zero(width: Width) -> Value {
        Value {
            width,
            value: BigUint::zero(),
        }
    }

    pub fn width(&self) -> Width {
        self.width
    }

    pub fn value(&self) -> &BigUint {
        &self.value
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    pub fn bit(&self, i: u64) -> bool {
        self.value.bit(i)
    }

    /// The top bit. False for a zero-width value.
    pub fn sign_bit(&self) -> bool {
        self.width > 0 && self.bit(self.width - 1)
    }

    pub fn to_u64(&self) -> Option<u64> {
        self.value.to_u64()
    }

    /// The same payload at another width, truncated or zero-extended.
    pub fn resize(&self, width: Width) -> Value {
        Value::new(width, self.value.clone())
    }

    /// `width` bits starting at bit `base`. Bits past the top read as zero.
    pub fn extract(&self, base: u64, width: Width) -> Value {
        Value::new(width, &self.value >> base)
    }

    /// `self` in the high bits, `low` in the low bits.
    pub fn concat(&self, low: &Value) -> Value {
        let value = (&self.value << low.width) | &low.value;
        Value::new(self.width + low.width, value)
    }

    pub fn to_string_radix(&self, radix: Radix) -> String {
        match radix {
            Radix::Binary => pad(self.value.to_str_radix(2), self.width),
            Radix::Decimal => self.value.to_str_radix(10),
            Radix::Hex => pad(self.value.to_str_radix(16), self.width.div_ceil(4)),
        }
    }
}

fn pad(digits: String, len: u64) -> String {
    let len = len as usize;
    if digits.len() >= len {
        digits
    } else {
        format!("{}{digits}", "0".repeat(len - digits.len()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Radix {
    Binary,
    #[default]
    Decimal,
    Hex,
}

impl std::str::FromStr for Radix {
    type Err = String;

    fn from_str(s: &str) -> Result<Radix, String> {
        match s.to_ascii_lowercase().as_str() {
            "bin" | "binary" | "b" => Ok(Radix::Binary),
            "dec" | "decimal" | "d" => Ok(Radix::Decimal),
            "hex" | "h" | "x" => Ok(Radix::Hex),
            _ => Err(format!("Unknown radix: {s} (expected bin, dec, or hex)")),
        }
    }
}

impl From<bool> for Value {
    fn from(x: bool) -> Value {
        Value::from_u64(1, if x { 1 } else { 0 })
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}w{}", self.value, self.width)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}w{}", self.value, self.width)
    }
}

impl std::fmt::LowerHex for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}w{}", self.to_string_radix(Radix::Hex), self.width)
    }
}

impl std::fmt::Binary for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0b{}w{}", self.to_string_radix(Radix::Binary), self.width)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn values_are_masked() {
        let v = Value::from_u64(4, 0x1F);
        assert_eq!(v.to_u64(), Some(0xF));
        assert_eq!(Value::from_u64(0, 5), Value::zero(0));
        assert_eq!(Value::from_u64(8, 256).to_string(), "0w8");

        let wide = Value::new(100, BigUint::one() << 100u32);
        assert!(wide.is_zero());
        assert!(wide.value().bits() <= wide.width());
    }

    #[test]
    fn resize_truncates_and_extends() {
        let v = Value::from_u64(8, 0xAB);
        assert_eq!(v.resize(4), Value::from_u64(4, 0xB));
        assert_eq!(v.resize(16), Value::from_u64(16, 0xAB));
    }

    #[test]
    fn extract_and_concat() {
        let v = Value::from_u64(8, 0b1011_0100);
        assert_eq!(v.extract(2, 4), Value::from_u64(4, 0b1101));
        assert_eq!(v.extract(6, 4), Value::from_u64(4, 0b10));

        let hi = Value::from_u64(4, 0xA);
        let lo = Value::from_u64(4, 0xB);
        assert_eq!(hi.concat(&lo), Value::from_u64(8, 0xAB));
        assert_eq!(Value::zero(0).concat(&lo), lo);
    }

    #[test]
    fn rendering() {
        let v = Value::from_u64(6, 5);
        assert_eq!(v.to_string_radix(Radix::Binary), "000101");
        assert_eq!(v.to_string_radix(Radix::Decimal), "5");
        assert_eq!(v.to_string_radix(Radix::Hex), "05");
        assert_eq!(format!("{v:x}"), "0x05w6");
        assert_eq!(format!("{v:b}"), "0b000101w6");
        assert_eq!(format!("{v:?}"), "5w6");
        assert_eq!(Value::from(true).to_string(), "1w1");
        assert!(Value::from_u64(4, 8).sign_bit());
    }

    #[test]
    fn radix_from_str() {
        assert_eq!("hex".parse::<Radix>(), Ok(Radix::Hex));
        assert_eq!("BIN".parse::<Radix>(), Ok(Radix::Binary));
        assert!("octal".parse::<Radix>().is_err());
    }
}
