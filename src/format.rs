/// `MM:SS` read-out for the elapsed counter. Minutes keep counting past 59.
pub fn format_elapsed(total_seconds: u32) -> String {
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_minutes_and_seconds() {
        assert_eq!(format_elapsed(0), "00:00");
        assert_eq!(format_elapsed(5), "00:05");
        assert_eq!(format_elapsed(65), "01:05");
        assert_eq!(format_elapsed(3600), "60:00");
    }
}
