pub mod auth;
pub mod dashboard;

pub fn make_path(base: &str, suffix: &str) -> String {
    if suffix.is_empty() {
        return base.to_string();
    }
    let base = base.trim_end_matches('/');
    format!("{}{}", base, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_path_root_base() {
        assert_eq!(make_path("/", ""), "/");
        assert_eq!(make_path("/", "/login"), "/login");
        assert_eq!(make_path("/", "/api/generate"), "/api/generate");
    }

    #[test]
    fn make_path_nested_base() {
        assert_eq!(make_path("/studio", ""), "/studio");
        assert_eq!(make_path("/studio", "/login"), "/studio/login");
        assert_eq!(make_path("/studio", "/dashboard"), "/studio/dashboard");
    }

    #[test]
    fn make_path_trailing_slash_base() {
        assert_eq!(make_path("/studio/", "/login"), "/studio/login");
    }
}
