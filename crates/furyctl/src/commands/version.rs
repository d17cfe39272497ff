use tracing::instrument;

#[instrument]
pub fn get_version_info() -> String {
    format!(
        "{} {} - {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_DESCRIPTION")
    )
}

#[allow(clippy::print_stdout)]
pub fn execute() {
    println!("{}", get_version_info());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_info_names_the_package() {
        let info = get_version_info();
        assert!(info.starts_with("furyctl "));
        assert!(info.contains(env!("CARGO_PKG_VERSION")));
    }
}
