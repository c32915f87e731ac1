use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::PaletteEntry;

const TABLE_HEAD: &str = "\
┏━━━━━━━━━━┳━━━━━━━━━━━━━━━━━┳━━━━━━━━━━┳━━━━━━━━━━━━━━━━━━━━┓
┃ Hex      ┃ RGB             ┃ Freq (%) ┃ Color-Blind Safe?  ┃
┡━━━━━━━━━━╇━━━━━━━━━━━━━━━━━╇━━━━━━━━━━╇━━━━━━━━━━━━━━━━━━━━┩
";

const TABLE_FOOT: &str = "└──────────┴─────────────────┴──────────┴────────────────────┘\n";

/// Where the text table and the figure for one input image go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputPaths {
    pub text: PathBuf,
    pub figure: PathBuf,
}

impl OutputPaths {
    /// `<outdir>/<stem>_palette.{txt,png}`, with `outdir` defaulting to the
    /// image's own directory.
    pub fn new(image_path: &Path, outdir: Option<&Path>) -> anyhow::Result<Self> {
        let stem = image_path
            .file_stem()
            .with_context(|| format!("path has no file name: {}", image_path.display()))?
            .to_string_lossy();
        let dir = outdir.unwrap_or_else(|| image_path.parent().unwrap_or(Path::new("")));

        Ok(Self {
            text: dir.join(format!("{}_palette.txt", stem)),
            figure: dir.join(format!("{}_palette.png", stem)),
        })
    }
}

pub fn format_row(entry: &PaletteEntry) -> String {
    let [r, g, b] = entry.rgb;
    let rgb = format!("({}, {}, {})", r, g, b);
    let flag = if entry.colorblind_safe { "YES" } else { "NO" };
    format!(
        "│ {:<8} │ {:<15} │ {:>6.1}% │ {:<18} │\n",
        entry.hex, rgb, entry.frequency, flag
    )
}

/// Lines of the summary table, each ending in a newline.
pub fn table_lines(entries: &[PaletteEntry], n_colors: usize, image_path: &Path) -> Vec<String> {
    let mut lines = Vec::with_capacity(entries.len() + 3);
    lines.push(format!(
        " Extracted {} colors from {}\n",
        n_colors,
        image_path.display()
    ));
    lines.push(TABLE_HEAD.to_string());
    lines.extend(entries.iter().map(format_row));
    lines.push(TABLE_FOOT.to_string());
    lines
}

/// The table as saved to `<stem>_palette.txt`.
pub fn format_table(lines: &[String]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(line);
    }
    out
}

/// The table as printed, with a blank line between lines.
pub fn console_table(lines: &[String]) -> String {
    lines.join("\n")
}

pub fn write_table(path: &Path, table: &str) -> anyhow::Result<()> {
    std::fs::write(path, table).with_context(|| format!("Writing {}", path.display()))
}
