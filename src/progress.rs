/// Completed lessons as a whole-number percentage, rounded to nearest.
pub fn percent(completed: i64, total: i64) -> i32 {
    if total <= 0 {
        return 0;
    }
    let completed = completed.clamp(0, total);
    ((completed * 200 + total) / (total * 2)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_course_has_no_progress() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(3, 0), 0);
    }

    #[test]
    fn rounds_to_nearest() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(1, 2), 50);
    }

    #[test]
    fn bounded() {
        assert_eq!(percent(5, 5), 100);
        assert_eq!(percent(9, 5), 100);
        assert_eq!(percent(-1, 5), 0);
    }
}
