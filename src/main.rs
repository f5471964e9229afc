//! APNG Forge CLI - Assemble PNG frames into an animated PNG.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use apng_forge::{
    animation::{AnimationAssembler, AnimationSummary, EncodedAnimation, PngCodec, is_png},
    schema::AnimationConfig,
};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && args[1] == "--example" {
        print_example_config();
        return;
    }

    if args.len() < 4 {
        eprintln!("Usage: {} <config.json> <output.png> <frame.png>...", args[0]);
        eprintln!();
        eprintln!("Assemble PNG frames, in argument order, into an animated PNG.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to animation configuration (fps, loops, quality)");
        eprintln!("  output.png   Where to write the APNG");
        eprintln!("  frame.png    One or more PNG frames of identical size");
        eprintln!();
        eprintln!("Example configuration is printed with --example flag.");
        std::process::exit(1);
    }

    let config_path = PathBuf::from(&args[1]);
    let output = PathBuf::from(&args[2]);
    let inputs: Vec<PathBuf> = args[3..].iter().map(PathBuf::from).collect();

    // Load configuration
    let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    let config: AnimationConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });

    println!("APNG Forge");
    println!("==========");
    println!("Frames: {}", inputs.len());
    println!(
        "Rate: {} fps ({} ms per frame)",
        config.fps,
        config.frame_delay_ms()
    );
    println!(
        "Loops: {}",
        if config.is_infinite() {
            "infinite".to_string()
        } else {
            config.loops.to_string()
        }
    );
    println!("Quality: {}", config.quality);
    println!();

    let start = Instant::now();
    let apng = generate(&config, &output, &inputs).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
    let elapsed = start.elapsed();

    println!("Wrote {}", output.display());
    println!("  {}", apng.stats());
    println!("  Media type: {}", apng.media_type());
    println!("Time: {:.2}s", elapsed.as_secs_f32());
}

/// Read frames, assemble, verify and write the result.
fn generate(
    config: &AnimationConfig,
    output: &Path,
    inputs: &[PathBuf],
) -> Result<EncodedAnimation, String> {
    let mut images = Vec::with_capacity(inputs.len());
    for path in inputs {
        let bytes = fs::read(path).map_err(|e| format!("reading {}: {}", path.display(), e))?;
        if !is_png(&bytes) {
            return Err(format!("{} is not a PNG file", path.display()));
        }
        images.push(bytes);
    }

    let assembler = AnimationAssembler::new(PngCodec::default());
    let apng = assembler
        .assemble_images(&images, config)
        .map_err(|e| e.to_string())?;

    let summary = AnimationSummary::parse(apng.as_bytes()).map_err(|e| e.to_string())?;
    log::debug!(
        "Verified {} chunks, num_plays={:?}",
        summary.chunk_count,
        summary.num_plays()
    );

    fs::write(output, apng.as_bytes())
        .map_err(|e| format!("writing {}: {}", output.display(), e))?;
    Ok(apng)
}

fn print_example_config() {
    let config = AnimationConfig::default();

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing config: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apng_forge::{ImageCodec, PixelBuffer};
    use tempfile::tempdir;

    fn write_frame(dir: &Path, name: &str, rgba: [u8; 4]) -> PathBuf {
        let frame = PixelBuffer::solid(8, 8, rgba).unwrap();
        let bytes = PngCodec::new().encode(&[frame], 8, 8, &[0]).unwrap();
        let path = dir.join(name);
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_generate_writes_apng() {
        let dir = tempdir().unwrap();
        let inputs = vec![
            write_frame(dir.path(), "a.png", [255, 0, 0, 255]),
            write_frame(dir.path(), "b.png", [0, 255, 0, 255]),
        ];
        let output = dir.path().join("out.png");
        let config = AnimationConfig {
            fps: 5,
            loops: 1,
            quality: 100,
        };

        let apng = generate(&config, &output, &inputs).unwrap();
        assert_eq!(apng.frame_count(), 2);

        let written = fs::read(&output).unwrap();
        assert_eq!(written, apng.as_bytes());
        let summary = AnimationSummary::parse(&written).unwrap();
        assert_eq!(summary.num_plays(), Some(1));
        assert_eq!(summary.delays_ms(), vec![200.0, 200.0]);
    }

    #[test]
    fn test_generate_rejects_non_png() {
        let dir = tempdir().unwrap();
        let bogus = dir.path().join("frame.jpg");
        fs::write(&bogus, b"\xFF\xD8\xFF\xE0 not a png").unwrap();
        let output = dir.path().join("out.png");

        let err = generate(&AnimationConfig::default(), &output, &[bogus]).unwrap_err();
        assert!(err.contains("not a PNG"));
        assert!(!output.exists());
    }
}
