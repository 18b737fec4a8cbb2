use std::env;
use std::path::PathBuf;

// FFmpeg discovery on Windows is left to ffmpeg-sys-next; this only points
// out a vcpkg install it could use when FFMPEG_DIR is unset.
fn main() {
    for variable in ["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_TRIPLET"] {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    if env::var("CARGO_CFG_TARGET_OS").unwrap_or_default() != "windows"
        || env::var_os("FFMPEG_DIR").is_some()
    {
        return;
    }

    let Some(vcpkg_root) = env::var_os("VCPKG_ROOT") else {
        println!("cargo:warning=vidframes needs FFmpeg; set FFMPEG_DIR to its install prefix.");
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let candidate = PathBuf::from(vcpkg_root).join("installed").join(triplet);
    if candidate.join("include").join("libavformat").exists() {
        println!(
            "cargo:warning=Found FFmpeg under {}; set FFMPEG_DIR to that path if the build cannot locate it.",
            candidate.display(),
        );
    } else {
        println!(
            "cargo:warning=No FFmpeg headers under {}; install ffmpeg with vcpkg or set FFMPEG_DIR.",
            candidate.display(),
        );
    }
}
