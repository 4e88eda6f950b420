use std::{
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
};

use bin2uf2_core::{
    build_block_sequence, config::Config, output_path, uf2::UF2_BLOCK_SIZE, write_output,
    Bin2Uf2Error,
};
use log::{error, info, LevelFilter};

use crate::reporter::ProgressBarReporter;

/// Checks every input up front, nothing is converted unless all of them are usable.
pub fn validate_inputs(files: &[PathBuf]) -> Result<(), Box<dyn std::error::Error>> {
    if files.is_empty() {
        return Err("No input files given".into());
    }

    for file in files {
        let metadata = fs::metadata(file)
            .map_err(|err| format!("Unable to open {}: {}", file.display(), err))?;

        if !metadata.is_file() {
            return Err(format!("{} is not a file", file.display()).into());
        }
    }

    Ok(())
}

/// Converts each file in turn. A failing file is reported and the rest still get converted.
pub fn convert(files: &[PathBuf], config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    validate_inputs(files)?;

    let mut failed = 0;
    for file in files {
        if let Err(err) = convert_file(file, config) {
            error!("{}: {}", file.display(), err);
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(format!("{} of {} files failed to convert", failed, files.len()).into());
    }

    Ok(())
}

pub fn convert_file(
    input_path: &Path,
    config: &Config,
) -> Result<(PathBuf, usize), Box<dyn std::error::Error>> {
    let output_path = output_path(input_path)?;

    let image = fs::read(input_path).map_err(Bin2Uf2Error::FailedToRead)?;
    let sequence = build_block_sequence(&image, config)?;
    let tag = config.block_tag(image.len());

    let output = BufWriter::new(File::create(&output_path)?);

    let should_print_progress = log::max_level() >= LevelFilter::Info;

    let result = if should_print_progress {
        let len = (sequence.len() * UF2_BLOCK_SIZE) as u64;
        let label = input_path.file_name().unwrap_or_default().to_string_lossy();
        let mut reporter = ProgressBarReporter::new(len, &label, output);
        let result = write_output(&sequence, tag, &mut reporter);
        reporter.finish();
        println!();
        result
    } else {
        write_output(&sequence, tag, output)
    };

    if let Err(err) = result {
        fs::remove_file(&output_path)?;
        return Err(Box::new(err));
    }

    info!(
        "Wrote {} blocks to {}",
        sequence.len(),
        output_path.display()
    );

    Ok((output_path, sequence.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bin2uf2_core::reader::read_blocks;
    use std::{env, process};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("bin2uf2-{}-{}", name, process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_file_stops_whole_batch() {
        let dir = scratch_dir("missing");
        let present = dir.join("present.bin");
        fs::write(&present, [1u8; 10]).unwrap();

        let files = [present.clone(), dir.join("absent.bin")];
        assert!(convert(&files, &Config::default()).is_err());
        assert!(!dir.join("present.uf2").exists());

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn directory_is_not_an_input() {
        let dir = scratch_dir("directory");
        assert!(validate_inputs(&[dir.clone()]).is_err());
        assert!(validate_inputs(&[]).is_err());

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn unwritable_output_fails_alone() {
        let dir = scratch_dir("unwritable");
        let bad = dir.join("bad.bin");
        let good = dir.join("good.bin");
        fs::write(&bad, [0x11u8; 100]).unwrap();
        fs::write(&good, [0x22u8; 600]).unwrap();
        fs::create_dir(dir.join("bad.uf2")).unwrap();

        assert!(convert(&[bad.clone(), good.clone()], &Config::default()).is_err());

        let blocks = read_blocks(&fs::read(dir.join("good.uf2")).unwrap()).unwrap();
        assert_eq!(blocks.len(), 19);
        assert!(dir.join("bad.uf2").is_dir());

        let mut entries: Vec<_> = fs::read_dir(&dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        entries.sort();
        assert_eq!(entries, ["bad.bin", "bad.uf2", "good.bin", "good.uf2"]);

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn converts_next_to_input() {
        let dir = scratch_dir("convert");
        let first = dir.join("first.bin");
        let second = dir.join("second.bin");
        fs::write(&first, vec![0xa5u8; 300]).unwrap();
        fs::write(&second, b"").unwrap();

        convert(&[first.clone(), second.clone()], &Config::default()).unwrap();

        let blocks = read_blocks(&fs::read(dir.join("first.uf2")).unwrap()).unwrap();
        assert_eq!(blocks.len(), 18);
        let blocks = read_blocks(&fs::read(dir.join("second.uf2")).unwrap()).unwrap();
        assert_eq!(blocks.len(), 16);

        let (path, count) = convert_file(
            &first,
            &Config {
                mask_address: None,
                ..Config::default()
            },
        )
        .unwrap();
        assert_eq!(path, dir.join("first.uf2"));
        assert_eq!(count, 2);

        fs::remove_dir_all(dir).unwrap();
    }
}
