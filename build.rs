//! Build script: embeds the git hash and checks GPU toolkits for whisper builds.

use std::process::Command;

fn main() {
    // Embed git short hash for version string
    if let Ok(output) = Command::new("git")
        .args(["rev-parse", "--short=7", "HEAD"])
        .output()
        && output.status.success()
    {
        let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
        println!("cargo:rustc-env=GIT_HASH={}", hash);
    }
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads/");

    // Fail early instead of deep inside whisper-rs-sys.
    if cfg!(feature = "cuda") {
        require_tool("nvcc", &["--version"], "CUDA toolkit", "cuda");
    }
    if cfg!(feature = "vulkan") {
        require_tool("vulkaninfo", &["--summary"], "Vulkan SDK", "vulkan");
    }
}

fn require_tool(tool: &str, args: &[&str], toolkit: &str, feature: &str) {
    let found = Command::new(tool)
        .args(args)
        .output()
        .is_ok_and(|out| out.status.success());
    if !found {
        panic!(
            "`{}` not found: the {} is required by the `{}` feature. \
             Install it or build without `--features {}`.",
            tool, toolkit, feature, feature
        );
    }
    println!("cargo::warning={} detected", toolkit);
}
