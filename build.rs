//! Build script that reports the system OpenCV install and the model assets the
//! application expects at runtime.

use std::path::Path;
use std::process::Command;

/// Model files the default configuration points at.
const RUNTIME_ASSETS: [&str; 2] = ["assets/emotion-ferplus-8.onnx", "assets/haarcascade_frontalface_default.xml"];

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=PKG_CONFIG_PATH");
    println!("cargo:rerun-if-env-changed=OPENCV_LINK_PATHS");
    println!("cargo:rerun-if-env-changed=OPENCV_INCLUDE_PATHS");

    report_opencv();
    report_assets();
}

fn pkg_config_version(package: &str) -> Option<String> {
    let output = Command::new("pkg-config").args(["--modversion", package]).output().ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn report_opencv() {
    match pkg_config_version("opencv4").or_else(|| pkg_config_version("opencv")) {
        Some(version) => println!("cargo:warning=Found OpenCV version: {version}"),
        None => {
            println!("cargo:warning=OpenCV not found via pkg-config. The videoio, imgproc, objdetect and highgui modules are required.");
            println!("cargo:warning=On Ubuntu: sudo apt-get install libopencv-dev pkg-config");
            println!("cargo:warning=On macOS: brew install opencv pkg-config");
        }
    }
}

fn report_assets() {
    for asset in RUNTIME_ASSETS {
        println!("cargo:rerun-if-changed={asset}");
        if !Path::new(asset).exists() {
            println!("cargo:warning={asset} is missing; live detection will be unavailable until it is provided");
        }
    }
}
