#![cfg_attr(target_os = "windows", windows_subsystem = "windows")]

#[cfg(target_os = "windows")]
fn main() {
    std::process::exit(tilecascade::app::run());
}

#[cfg(not(target_os = "windows"))]
fn main() {
    eprintln!("tilecascade runs on Windows only.");
    std::process::exit(1);
}
