use crate::db::log::ttlog_quiet;
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success, warning};
use std::fs;
use std::io::{Write, stdin, stdout};
use std::path::{Path, PathBuf};
use zip::ZipWriter;
use zip::write::FileOptions;

pub struct BackupLogic;

impl BackupLogic {
    /// Copy the database to `dest_file`, optionally as a `.zip`.
    /// Returns the final path, or `None` when the user declined to overwrite.
    pub fn backup(
        pool: &DbPool,
        db_path: &str,
        dest_file: &str,
        compress: bool,
        force: bool,
    ) -> AppResult<Option<PathBuf>> {
        let src = Path::new(db_path);
        let dest = Path::new(dest_file);

        // 1️⃣ Check DB exists
        if !src.exists() {
            return Err(AppError::not_found("Database", src.display().to_string()));
        }

        // 2️⃣ Ensure destination folder exists
        if let Some(parent) = dest.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        // 2️⃣.5 Existing destination → ask confirmation unless --force
        if dest.exists() && !force && !confirm_overwrite(dest)? {
            warning("Backup cancelled by user.");
            return Ok(None);
        }

        // 3️⃣ Copy database
        fs::copy(src, dest)?;
        success(format!("Backup created: {}", dest.display()));

        // 4️⃣ Optional compression
        let final_path = if compress {
            let compressed = compress_backup(dest)?;
            if compressed != dest.to_path_buf() {
                if let Err(e) = fs::remove_file(dest) {
                    warning(format!("Failed to remove uncompressed backup: {e}"));
                } else {
                    info(format!("Removed uncompressed backup: {}", dest.display()));
                }
            }
            compressed
        } else {
            dest.to_path_buf()
        };

        // 5️⃣ Log in DB
        ttlog_quiet(
            &pool.conn,
            "backup",
            &final_path.to_string_lossy(),
            if compress {
                "Backup created and compressed"
            } else {
                "Backup created"
            },
        );

        Ok(Some(final_path))
    }
}

fn confirm_overwrite(dest: &Path) -> AppResult<bool> {
    println!(
        "⚠️  The file '{}' already exists.\nDo you want to overwrite it? [y/N]: ",
        dest.display()
    );
    print!("> ");
    stdout().flush()?;

    let mut answer = String::new();
    stdin().read_line(&mut answer)?;
    let answer = answer.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

/// Compress a backup using .zip
fn compress_backup(path: &Path) -> AppResult<PathBuf> {
    let zip_path = path.with_extension("zip");
    let file = fs::File::create(&zip_path)?;
    let mut zip = ZipWriter::new(file);

    let options: FileOptions<'_, ()> =
        FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "timeblocks.sqlite".to_string());

    let mut f = fs::File::open(path)?;
    zip.start_file(name, options).map_err(std::io::Error::other)?;

    std::io::copy(&mut f, &mut zip)?;
    zip.finish().map_err(std::io::Error::other)?;

    info(format!("Compressed: {}", zip_path.display()));
    Ok(zip_path)
}
