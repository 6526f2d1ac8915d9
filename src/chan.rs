//! Channel name utilities.

/// Extension trait for checking if a string names an IRC channel.
pub trait ChannelExt {
    /// Check if this string is a valid IRC channel name.
    ///
    /// Valid channel names start with `#`, `&`, `+`, or `!`, contain no
    /// space, comma, BEL, or control characters, and are at most 50
    /// characters long.
    fn is_channel_name(&self) -> bool;
}

impl ChannelExt for &str {
    fn is_channel_name(&self) -> bool {
        let mut chars = self.chars();

        match chars.next() {
            Some('#' | '&' | '+' | '!') => {}
            _ => return false,
        }

        if self.chars().count() > 50 {
            return false;
        }

        for c in chars {
            if c == ' ' || c == ',' || c == '\x07' || c.is_control() {
                return false;
            }
        }

        true
    }
}

impl ChannelExt for String {
    fn is_channel_name(&self) -> bool {
        self.as_str().is_channel_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_channels() {
        assert!("#rust".is_channel_name());
        assert!("&local".is_channel_name());
    }

    #[test]
    fn test_invalid_channels() {
        assert!(!"rust".is_channel_name());
        assert!(!"#with space".is_channel_name());
        assert!(!"#with,comma".is_channel_name());
        assert!(!"".is_channel_name());
    }
}
