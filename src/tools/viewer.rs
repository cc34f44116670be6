use winit::dpi;

#[derive(clap::Parser)]
#[derive(Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(group(
    clap::ArgGroup::new("size")
        .args(&["width", "height"])
        .requires_all(&["width", "height"])
        .multiple(true)
))]
struct Args {
    // JSON file holding an `rt::Config`, flags below override it
    #[clap(long, value_parser)]
    config: Option<String>,

    #[clap(long, short, value_parser)]
    width: Option<u32>,

    #[clap(long, short, value_parser)]
    height: Option<u32>,

    #[clap(long, value_parser)]
    title: Option<String>,

    // Device configuration string, e.g. "verbose=1,leaf_size=4"
    #[clap(long, value_parser)]
    device: Option<String>,

    #[clap(long = "no-vsync", action)]
    no_vsync: bool,

    // One of off, error, warn, info, debug, trace
    #[clap(long = "log-level", value_parser, default_value_t = log::LevelFilter::Info)]
    log_level: log::LevelFilter,
}

fn main() -> anyhow::Result<()> {
    use clap::Parser as _;

    let Args {
        config,
        width,
        height,
        title,
        device,
        no_vsync,
        log_level: level, ..
    } = Args::parse();

    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Warn)
        .with_module_level("rt", level)
        .with_module_level("viewer", level)
        .init()?;

    let mut config = match config {
        Some(path) => rt::Config::from_path(path)?,
        None => rt::Config::default(),
    };

    if let (Some(width), Some(height)) = (width, height) {
        config.window.size = dpi::LogicalSize::new(width, height);
    }

    if let Some(title) = title {
        config.window.title = title;
    }

    if device.is_some() {
        config.device = device;
    }

    if no_vsync {
        config.window.vsync = false;
    }

    log::debug!("{:?}", config);

    let device = rt::tutorial::initialize_device(config.device.as_deref())?;
    let scene = rt::tutorial::initialize_scene(&device)?;

    pollster::block_on(rt::run_native(config, scene))
}
