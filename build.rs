//! Stamps `brres-cli --version` with the build profile and a UTC timestamp.
//! `SOURCE_DATE_EPOCH` pins the timestamp for reproducible builds.

use time::OffsetDateTime;

fn stamp() -> Option<String> {
    let now = match std::env::var("SOURCE_DATE_EPOCH") {
        Ok(epoch) => OffsetDateTime::from_unix_timestamp(epoch.trim().parse().ok()?).ok()?,
        Err(_) => OffsetDateTime::now_utc(),
    };
    let format = time::format_description::parse("[year]-[month]-[day] [hour]:[minute] UTC").ok()?;
    now.format(&format).ok()
}

fn main() {
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());
    let stamp = stamp().unwrap_or_else(|| "unknown date".to_string());

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");
    println!("cargo:rustc-env=BRRES_BUILD_INFO={profile} build, {stamp}");
}
