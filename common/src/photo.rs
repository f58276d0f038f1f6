use chrono::{Local, NaiveDateTime};

/// Number of photos taken per button press.
pub const SHOTS_PER_SESSION: u32 = 3;

/// Build the filename stem shared by every photo of a session.
///
/// The timestamp is rendered to the second, then spaces become `_` and colons
/// become `-` so the result is a valid path component on FAT-formatted sticks.
/// e.g. 2024-01-01 12:00:00 -> "2024-01-01_12-00-00"
pub fn stem_from(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S")
        .to_string()
        .replace(' ', "_")
        .replace(':', "-")
}

/// Stem for a session starting now, in local wall-clock time.
pub fn current_stem() -> String {
    stem_from(Local::now().naive_local())
}

/// File name of one photo in a session, e.g. "2024-01-01_12-00-00_2of3.jpg".
pub fn photo_file_name(stem: &str, index: u32) -> String {
    format!("{stem}_{index}of{SHOTS_PER_SESSION}.jpg")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32, s: u32, ms: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_milli_opt(h, m, s, ms)
            .unwrap()
    }

    #[test]
    fn stem_has_no_spaces_or_colons() {
        let stem = stem_from(ts(12, 0, 0, 0));
        assert_eq!(stem, "2024-01-01_12-00-00");
        assert!(!stem.contains(' '));
        assert!(!stem.contains(':'));
    }

    #[test]
    fn stem_drops_sub_second_precision() {
        assert_eq!(stem_from(ts(9, 5, 7, 999)), "2024-01-01_09-05-07");
        assert_eq!(stem_from(ts(9, 5, 7, 999)), stem_from(ts(9, 5, 7, 1)));
    }

    #[test]
    fn current_stem_is_filename_safe() {
        let stem = current_stem();
        assert_eq!(stem.len(), "2024-01-01_12-00-00".len());
        assert!(!stem.contains(' ') && !stem.contains(':'));
    }

    #[test]
    fn photo_names_follow_index_of_total() {
        let stem = "2024-01-01_12-00-00";
        let names: Vec<String> = (1..=SHOTS_PER_SESSION)
            .map(|i| photo_file_name(stem, i))
            .collect();
        assert_eq!(
            names,
            vec![
                "2024-01-01_12-00-00_1of3.jpg",
                "2024-01-01_12-00-00_2of3.jpg",
                "2024-01-01_12-00-00_3of3.jpg",
            ]
        );
    }
}
