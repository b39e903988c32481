use std::process::Command;

fn main() {
    // Prefer SHORTCUTS_VERSION if set (release builds), otherwise git describe.
    if let Ok(version) = std::env::var("SHORTCUTS_VERSION") {
        println!("cargo:rustc-env=SHORTCUTS_VERSION={version}");
    } else if let Ok(output) = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        && output.status.success()
    {
        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        println!("cargo:rustc-env=SHORTCUTS_VERSION={version}");
    }

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-env-changed=SHORTCUTS_VERSION");
}
