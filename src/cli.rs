use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rvol")]
#[command(version)]
#[command(about = "Extract 3-Space engine VOL/DYN/RMF archives and inspect PBMP bitmaps", long_about = None)]
#[command(after_help = "Examples:\n  \
  rvol SIMVOL0.VOL -x '*.PBA'              extract everything except PBA files\n  \
  rvol -l SIMVOL0.VOL/TEXTURES.DYN         list an archive nested inside another\n  \
  rvol -p SIMVOL0.VOL README.TXT | more    send one entry through a pipe\n  \
  rvol -b SIMVOL0.VOL/SKY.PBA              show a bitmap's dimensions and palette")]
pub struct Cli {
    /// Archive path, possibly continuing into nested archives
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Entries to extract (default: all)
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,

    /// List files (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely with sizes and offsets
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Extract files to pipe, no messages
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Extract files into exdir
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<PathBuf>,

    /// Exclude files that follow
    #[arg(short = 'x', value_name = "FILE", num_args = 1..)]
    pub exclude: Vec<String>,

    /// Never overwrite existing files
    #[arg(short = 'n')]
    pub never_overwrite: bool,

    /// Overwrite files WITHOUT prompting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Junk paths (do not make directories)
    #[arg(short = 'j')]
    pub junk_paths: bool,

    /// Decode FILE as a PBMP or BMP and print its header and palette
    #[arg(short = 'b', long = "bitmap")]
    pub bitmap: bool,

    /// Directory that relative paths are resolved against
    #[arg(short = 'r', long = "root", value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }
}
