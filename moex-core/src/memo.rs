use std::fmt;

/// Field separator on the wire.
pub const FIELD_SEP: &str = ",";

/// Action and mode strings the device speaks.
pub mod wire {
    pub const CLICK: &str = "CLICK";
    pub const SCROLL: &str = "SCROLL";
    pub const ZOOM: &str = "ZOOM";
    pub const ZOOM_START: &str = "ZOOM_START";
    pub const CONNECTION: &str = "CONNECTION";
    pub const KEEP_ALIVE: &str = "KEEP_ALIVE";
    pub const END: &str = "END";
}

/// One device message: a comma-joined record of 4 fields, with an
/// optional 5th diagnostic field on receive.
///
/// The device is unreliable and garbled lines are expected under load,
/// so decoding is fail-soft: anything that is not a 4- or 5-field
/// record comes back as the all-empty memo, and numeric accessors
/// return 0 instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Memo {
    pub action: String,
    pub mode: String,
    pub value1: String,
    pub value2: String,
    pub debug: String,
}

impl Memo {
    pub fn new(
        action: impl Into<String>,
        mode: impl Into<String>,
        value1: impl ToString,
        value2: impl ToString,
    ) -> Self {
        Self {
            action: action.into(),
            mode: mode.into(),
            value1: value1.to_string(),
            value2: value2.to_string(),
            debug: String::new(),
        }
    }

    /// Decode one line. Field count outside 4..=5 yields the empty memo.
    pub fn from_line(line: &str) -> Self {
        let parts: Vec<&str> = line.split(FIELD_SEP).collect();
        if !(4..=5).contains(&parts.len()) {
            return Self::default();
        }

        let mut memo = Self {
            action: parts[0].to_owned(),
            mode: parts[1].to_owned(),
            value1: parts[2].to_owned(),
            value2: parts[3].to_owned(),
            debug: String::new(),
        };
        if parts.len() == 5 {
            memo.debug = parts[4].to_owned();
        }
        memo
    }

    /// First value as an integer (parsed as float, truncated); 0 on failure.
    pub fn value1_int(&self) -> i32 {
        int_field(&self.value1)
    }

    /// Second value as an integer (parsed as float, truncated); 0 on failure.
    pub fn value2_int(&self) -> i32 {
        int_field(&self.value2)
    }

    /// First value as a float; 0.0 on failure.
    pub fn value1_float(&self) -> f32 {
        self.value1.parse().unwrap_or(0.0)
    }
}

fn int_field(s: &str) -> i32 {
    s.parse::<f64>().map(|v| v as i32).unwrap_or(0)
}

impl fmt::Display for Memo {
    /// Wire encoding: the 4 core fields, debug omitted.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{sep}{}{sep}{}{sep}{}",
            self.action,
            self.mode,
            self.value1,
            self.value2,
            sep = FIELD_SEP
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_core_fields() {
        let memo = Memo::new(wire::SCROLL, "DRAG", 12, -3);
        let decoded = Memo::from_line(&memo.to_string());
        assert_eq!(decoded, memo);
    }

    #[test]
    fn decodes_fifth_field_as_debug() {
        let memo = Memo::from_line("ZOOM,ZOOM_START,1.5,0,pinch");
        assert_eq!(memo.action, wire::ZOOM);
        assert_eq!(memo.mode, wire::ZOOM_START);
        assert_eq!(memo.debug, "pinch");
    }

    #[test]
    fn malformed_lines_decode_to_empty_memo() {
        for line in ["", "CLICK", "a,b,c", "a,b,c,d,e,f", "garbage line"] {
            assert_eq!(Memo::from_line(line), Memo::default(), "line: {line:?}");
        }
    }

    #[test]
    fn numeric_accessors_never_fail() {
        let memo = Memo::new(wire::SCROLL, "DRAG", "12.7", "junk");
        assert_eq!(memo.value1_int(), 12);
        assert_eq!(memo.value2_int(), 0);
        assert_eq!(memo.value1_float(), 12.7);

        let empty = Memo::default();
        assert_eq!(empty.value1_int(), 0);
        assert_eq!(empty.value1_float(), 0.0);
    }
}
