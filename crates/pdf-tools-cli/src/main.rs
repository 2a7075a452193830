use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use pdf_async_runtime::{AppLogger, StitchCommand, StitchUpdate, spawn_worker};
use pdf_stitch::{
    LayoutMode, MarginInput, MarginScope, PageLayoutConfig, Session, SortKey, StitchOptions,
    StitchStatistics, validate_output_path,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "pdft", about = "Stitch scanned images into a PDF", version)]
struct Cli {
    /// Log debug messages to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crop, pair and write images as a PDF
    Stitch {
        #[command(flatten)]
        session: SessionArgs,

        #[command(flatten)]
        export: ExportArgs,

        /// Output PDF file
        #[arg(short, long, required_unless_present = "stats_only")]
        output: Option<PathBuf>,

        /// Write the effective options as JSON
        #[arg(long)]
        save_config: Option<PathBuf>,

        /// Show statistics only, don't write a PDF
        #[arg(long)]
        stats_only: bool,
    },

    /// Render one composed page as an image
    Preview {
        #[command(flatten)]
        session: SessionArgs,

        #[command(flatten)]
        export: ExportArgs,

        /// Page number, starting at 1
        #[arg(long, default_value = "1")]
        page: usize,

        /// Output image file (PNG)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Render the crop outline over a single image
    CropPreview {
        /// Input image file
        #[arg(short, long)]
        input: PathBuf,

        /// Crop edges in pixels: LEFT,TOP,RIGHT,BOTTOM
        #[arg(long, value_parser = parse_crop)]
        crop: Option<MarginInput>,

        /// Output image file (PNG)
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Args)]
struct SessionArgs {
    /// Input image files or directories
    #[arg(short, long, required = true, num_args = 1..)]
    input: Vec<PathBuf>,

    /// Page layout
    #[arg(long, value_enum)]
    layout: Option<LayoutArg>,

    /// Give the first image its own page in double-page layouts
    #[arg(long)]
    cover: bool,

    /// Order of the images
    #[arg(long, value_enum)]
    sort: Option<SortArg>,

    /// Crop edges applied to every image: LEFT,TOP,RIGHT,BOTTOM
    #[arg(long, value_parser = parse_crop)]
    crop: Option<MarginInput>,

    /// Load options from a JSON file; flags override it
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct ExportArgs {
    /// Convert pages to grayscale
    #[arg(long)]
    grayscale: bool,

    /// Stream compression level, 0 (off) to 9
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=9))]
    compression: Option<u8>,

    /// Resolution in dots per inch
    #[arg(long)]
    dpi: Option<f32>,

    /// Scale factor applied to every cropped image
    #[arg(long)]
    scale: Option<f32>,

    /// Export images whose crop is empty instead of failing
    #[arg(long)]
    allow_empty_crops: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum LayoutArg {
    Single,
    Ltr,
    Rtl,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Name,
    Created,
    Modified,
}

impl From<LayoutArg> for LayoutMode {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Single => Self::SinglePage,
            LayoutArg::Ltr => Self::DoublePageLeftToRight,
            LayoutArg::Rtl => Self::DoublePageRightToLeft,
        }
    }
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Name => Self::Name,
            SortArg::Created => Self::CreationTime,
            SortArg::Modified => Self::ModificationTime,
        }
    }
}

fn parse_crop(s: &str) -> std::result::Result<MarginInput, String> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<i64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid crop value: {e}"))?;
    match values[..] {
        [left, top, right, bottom] => Ok(MarginInput::new(left, top, right, bottom)),
        _ => Err(format!("expected LEFT,TOP,RIGHT,BOTTOM, got {} values", values.len())),
    }
}

/// Options from `--config` (or defaults) with command line flags applied
async fn build_options(session: &SessionArgs, export: &ExportArgs) -> Result<StitchOptions> {
    let mut options = match &session.config {
        Some(path) => StitchOptions::load(path)
            .await
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => StitchOptions::default(),
    };

    if let Some(layout) = session.layout {
        options.layout.mode = layout.into();
    }
    if session.cover {
        options.layout.separate_cover = true;
    }
    if let Some(sort) = session.sort {
        options.sort_key = sort.into();
    }

    let e = &mut options.export;
    if export.grayscale {
        e.grayscale = true;
    }
    if let Some(level) = export.compression {
        e.compression_level = level;
    }
    if let Some(dpi) = export.dpi {
        e.dpi = dpi;
    }
    if let Some(scale) = export.scale {
        e.scale = scale;
    }
    if export.allow_empty_crops {
        e.reject_degenerate_crops = false;
    }

    options.validate()?;
    Ok(options)
}

/// Front end of a worker: sends commands, waits for their answers
struct Client {
    commands: mpsc::UnboundedSender<StitchCommand>,
    updates: mpsc::UnboundedReceiver<StitchUpdate>,
}

impl Client {
    fn start(options: &StitchOptions) -> Self {
        let (commands, updates, _task) = spawn_worker(Session::with_options(options).into_shared());
        Self { commands, updates }
    }

    fn send(&self, command: StitchCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| anyhow!("Worker stopped"))
    }

    /// Next update that answers a command; errors become `Err`
    async fn next(&mut self) -> Result<StitchUpdate> {
        loop {
            match self.updates.recv().await {
                Some(StitchUpdate::SessionChanged { .. }) => continue,
                Some(StitchUpdate::Error { message }) => bail!(message),
                Some(update) => return Ok(update),
                None => bail!("Worker stopped"),
            }
        }
    }

    async fn load(&mut self, inputs: Vec<PathBuf>, crop: Option<MarginInput>) -> Result<usize> {
        self.send(StitchCommand::Load { inputs })?;
        let count = match self.next().await? {
            StitchUpdate::Loaded { count, skipped } => {
                // Each skipped file was already logged as a warning
                println!("Loaded {} images ({} skipped)", count, skipped.len());
                count
            }
            other => bail!("Unexpected update: {other:?}"),
        };

        if let Some(input) = crop {
            self.send(StitchCommand::SetMargins {
                input,
                scope: MarginScope::All,
            })?;
        }
        Ok(count)
    }

    async fn statistics(&mut self) -> Result<StitchStatistics> {
        self.send(StitchCommand::CalculateStats)?;
        match self.next().await? {
            StitchUpdate::StatsCalculated { stats } => Ok(stats),
            other => bail!("Unexpected update: {other:?}"),
        }
    }
}

fn print_statistics(layout: PageLayoutConfig, stats: &StitchStatistics) {
    println!("Stitch Statistics ({}):", layout.mode.name());
    println!("  Source images: {}", stats.source_images);
    println!("  Output pages: {}", stats.output_pages);
    println!("  Spreads: {}", stats.spreads);
    println!("  Single pages: {}", stats.single_pages);
    println!("  Blank slots: {}", stats.blank_slots);
}

fn save_rgba(path: &Path, width: usize, height: usize, rgba_data: Vec<u8>) -> Result<()> {
    let image = image::RgbaImage::from_raw(width as u32, height as u32, rgba_data)
        .ok_or_else(|| anyhow!("Rendered image has the wrong size"))?;
    image
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    AppLogger::new(1000)
        .with_level(level)
        .with_stderr_echo(true)
        .init()?;

    match cli.command {
        Commands::Stitch {
            session,
            export,
            output,
            save_config,
            stats_only,
        } => {
            let options = build_options(&session, &export).await?;
            if let Some(path) = &save_config {
                options.save(path).await?;
                println!("Saved options → {}", path.display());
            }
            if let Some(path) = &output {
                validate_output_path(path)?;
            }

            let mut client = Client::start(&options);
            client.load(session.input, session.crop).await?;

            let stats = client.statistics().await?;
            print_statistics(options.layout, &stats);
            if stats_only {
                return Ok(());
            }
            let Some(output) = output else {
                bail!("No output file given");
            };

            client.send(StitchCommand::Export {
                options: options.export,
                output_path: output,
            })?;
            loop {
                match client.next().await? {
                    StitchUpdate::Progress {
                        operation,
                        current,
                        total,
                    } => {
                        eprint!("\r{operation} {current}/{total}");
                        let _ = std::io::stderr().flush();
                        if current == total {
                            eprintln!();
                        }
                    }
                    StitchUpdate::ExportComplete { path, page_count } => {
                        println!("Stitched {} pages → {}", page_count, path.display());
                        break;
                    }
                    StitchUpdate::ExportSkipped => {
                        println!("No images to stitch; nothing written");
                        break;
                    }
                    StitchUpdate::ExportCancelled => bail!("Export cancelled"),
                    other => bail!("Unexpected update: {other:?}"),
                }
            }
        }

        Commands::Preview {
            session,
            export,
            page,
            output,
        } => {
            if page == 0 {
                bail!("Pages are numbered from 1");
            }
            let options = build_options(&session, &export).await?;

            let mut client = Client::start(&options);
            client.load(session.input, session.crop).await?;
            client.send(StitchCommand::SetPreviewOptions {
                options: options.export,
            })?;
            client.send(StitchCommand::RenderPreview {
                page_index: page - 1,
            })?;

            match client.next().await? {
                StitchUpdate::PreviewRendered {
                    page_index,
                    page_count,
                    width,
                    height,
                    rgba_data,
                } => {
                    save_rgba(&output, width, height, rgba_data)?;
                    println!(
                        "Page {} of {} ({}x{}) → {}",
                        page_index + 1,
                        page_count,
                        width,
                        height,
                        output.display()
                    );
                }
                other => bail!("Unexpected update: {other:?}"),
            }
        }

        Commands::CropPreview {
            input,
            crop,
            output,
        } => {
            let mut client = Client::start(&StitchOptions::default());
            if client.load(vec![input.clone()], crop).await? == 0 {
                bail!("{} is not a readable image", input.display());
            }
            client.send(StitchCommand::RenderCropPreview { index: 0 })?;

            match client.next().await? {
                StitchUpdate::CropPreviewRendered {
                    width,
                    height,
                    rgba_data,
                    ..
                } => {
                    save_rgba(&output, width, height, rgba_data)?;
                    println!("Crop preview → {}", output.display());
                }
                other => bail!("Unexpected update: {other:?}"),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdf_stitch::ExportOptions;

    #[test]
    fn test_parse_crop() {
        assert_eq!(parse_crop("1, 2,3,4").unwrap(), MarginInput::new(1, 2, 3, 4));
        assert_eq!(parse_crop("-5,0,100,60").unwrap(), MarginInput::new(-5, 0, 100, 60));
        assert!(parse_crop("1,2,3").is_err());
        assert!(parse_crop("a,b,c,d").is_err());
    }

    #[test]
    fn test_cli_parses_stitch() {
        let cli = Cli::try_parse_from([
            "pdft", "stitch", "-i", "scans", "-o", "out.pdf", "--layout", "rtl", "--cover",
            "--sort", "name", "--crop", "10,10,500,700", "--compression", "9",
        ])
        .unwrap();
        let Commands::Stitch {
            session, export, ..
        } = cli.command
        else {
            panic!("expected stitch");
        };
        assert!(matches!(session.layout, Some(LayoutArg::Rtl)));
        assert!(session.cover);
        assert_eq!(export.compression, Some(9));
        assert_eq!(session.crop, Some(MarginInput::new(10, 10, 500, 700)));
    }

    #[test]
    fn test_cli_rejects_bad_compression() {
        let result = Cli::try_parse_from([
            "pdft", "stitch", "-i", "scans", "-o", "out.pdf", "--compression", "12",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_stats_only_needs_no_output() {
        assert!(Cli::try_parse_from(["pdft", "stitch", "-i", "scans", "--stats-only"]).is_ok());
        assert!(Cli::try_parse_from(["pdft", "stitch", "-i", "scans"]).is_err());
    }

    #[tokio::test]
    async fn test_flags_override_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("options.json");
        let saved = StitchOptions {
            layout: PageLayoutConfig::new(LayoutMode::DoublePageLeftToRight, false),
            sort_key: SortKey::ModificationTime,
            export: ExportOptions {
                dpi: 150.0,
                ..Default::default()
            },
        };
        saved.save(&config).await.unwrap();

        let cli = Cli::try_parse_from([
            "pdft",
            "stitch",
            "-i",
            "scans",
            "--stats-only",
            "--config",
            config.to_str().unwrap(),
            "--sort",
            "name",
            "--grayscale",
        ])
        .unwrap();
        let Commands::Stitch {
            session, export, ..
        } = cli.command
        else {
            panic!("expected stitch");
        };

        let options = build_options(&session, &export).await.unwrap();
        assert_eq!(options.layout.mode, LayoutMode::DoublePageLeftToRight);
        assert_eq!(options.sort_key, SortKey::Name);
        assert_eq!(options.export.dpi, 150.0);
        assert!(options.export.grayscale);
    }
}
