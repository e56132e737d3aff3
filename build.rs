// Build script to compile GLSL shaders to SPIR-V

use std::process::Command;

const SHADER_SOURCES: &[&str] = &["shaders/shader.vert", "shaders/shader.frag"];

fn main() {
    for source in SHADER_SOURCES {
        println!("cargo:rerun-if-changed={source}");
        compile_shader(source);
    }
}

// Uses glslc from the Vulkan SDK; a missing compiler is only a warning so
// the crate still builds on machines that ship precompiled .spv files
fn compile_shader(source: &str) {
    let output = format!("{source}.spv");

    match Command::new("glslc").arg(source).arg("-o").arg(&output).status() {
        Ok(status) if status.success() => {
            println!("compiled {source} -> {output}");
        }
        Ok(status) => {
            panic!("glslc rejected {source} (exit code {:?})", status.code());
        }
        Err(e) => {
            eprintln!("warning: glslc unavailable ({e})");
            eprintln!("compile by hand if needed: glslc {source} -o {output}");
        }
    }
}
