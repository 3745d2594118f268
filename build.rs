use std::env;
use std::path::{Path, PathBuf};

const WATCHED_VARIABLES: &[&str] = &["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_DYNAMIC", "VCPKGRS_TRIPLET"];

fn main() {
    for variable in WATCHED_VARIABLES {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    if let Some(ffmpeg_dir) = env::var_os("FFMPEG_DIR") {
        check_ffmpeg_dir(Path::new(&ffmpeg_dir));
        return;
    }

    if env::var("CARGO_CFG_TARGET_OS").unwrap_or_default() == "windows" {
        suggest_vcpkg_install();
    }
}

/// Warn when `FFMPEG_DIR` lacks a header of a library stillshot links against.
fn check_ffmpeg_dir(ffmpeg_dir: &Path) {
    for header in ["libavcodec/avcodec.h", "libavfilter/buffersink.h", "libswscale/swscale.h"] {
        let path = ffmpeg_dir.join("include").join(header);
        if !path.exists() {
            println!(
                "cargo:warning=FFMPEG_DIR={} has no {}; stillshot needs the avcodec, avfilter and swscale development headers.",
                ffmpeg_dir.display(),
                header,
            );
        }
    }
}

fn suggest_vcpkg_install() {
    let Ok(vcpkg_root) = env::var("VCPKG_ROOT") else {
        println!(
            "cargo:warning=FFMPEG_DIR is not set. On Windows, install FFmpeg via vcpkg and set VCPKG_ROOT + FFMPEG_DIR."
        );
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let install_dir = PathBuf::from(vcpkg_root).join("installed").join(triplet);

    if install_dir.exists() {
        println!(
            "cargo:warning=Using vcpkg FFmpeg at {0}. Set FFMPEG_DIR={0} to skip discovery.",
            install_dir.display(),
        );
        if env::var_os("VCPKGRS_DYNAMIC").is_none() {
            println!("cargo:warning=Set VCPKGRS_DYNAMIC=1 when linking a dynamic vcpkg FFmpeg build.");
        }
    } else {
        println!(
            "cargo:warning=VCPKG_ROOT is set but no FFmpeg install was found at {}.",
            install_dir.display(),
        );
    }
}
