use std::path::Path;
use std::process::Command;

/// Short commit of the workspace checkout, with `-dirty` for uncommitted changes.
fn git_describe(repo: &Path) -> Option<String> {
    let out = Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(["describe", "--always", "--dirty", "--abbrev=8"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let text = String::from_utf8(out.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn main() {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let workspace = Path::new(&manifest_dir).join("..");

    let head = workspace.join(".git").join("HEAD");
    if head.exists() {
        println!("cargo:rerun-if-changed={}", head.display());
    }

    let build = git_describe(&workspace).unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=CARDBATCH_BUILD_SHA={build}");
}
