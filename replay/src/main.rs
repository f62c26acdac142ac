#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use structopt::StructOpt;

use features::Format;
use replay::{
    ingestion_channel, HostEvent, LayerView, PlaybackController, ReplayConfig, ScreenPt,
    SoftwareRenderer,
};

#[derive(StructOpt)]
#[structopt(about = "Replays tracks headlessly, logging what every frame shows")]
struct Args {
    /// The path to query results: GeoJSON, an ArcGIS JSON feature set, or CSV with one vertex per
    /// row
    #[structopt(long)]
    input: String,
    /// By default, guessed from the file extension
    #[structopt(long)]
    format: Option<Format>,
    /// The path to a JSON config file
    #[structopt(long)]
    config: Option<String>,
    /// How far the time cursor advances each frame, in the configured progress unit
    #[structopt(long, default_value = "60")]
    step: f64,
    /// Stop after this many frames. By default, plays until every track has faded out.
    #[structopt(long)]
    frames: Option<usize>,
    /// Click somewhere on some frame, as `frame:x,y`. Can be repeated.
    #[structopt(long)]
    click: Vec<Click>,
    /// Write the ingested tracks as JSON to this path
    #[structopt(long)]
    dump_model: Option<String>,
}

struct Click {
    frame: usize,
    pt: ScreenPt,
}

impl FromStr for Click {
    type Err = anyhow::Error;

    fn from_str(x: &str) -> Result<Self> {
        let (frame, pt) = x
            .split_once(':')
            .ok_or_else(|| anyhow!("click {x} should look like frame:x,y"))?;
        let (px, py) = pt
            .split_once(',')
            .ok_or_else(|| anyhow!("click {x} should look like frame:x,y"))?;
        Ok(Click {
            frame: frame.trim().parse()?,
            pt: ScreenPt::new(px.trim().parse()?, py.trim().parse()?),
        })
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::from_args();
    if let Err(err) = run(args) {
        error!("{err:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    if !(args.step > 0.0) {
        bail!("--step must be positive");
    }
    let config = match args.config {
        Some(ref path) => ReplayConfig::load(path)?,
        None => ReplayConfig::default(),
    };
    let format = args.format.unwrap_or_else(|| Format::from_path(&args.input));
    let features = features::load(fs_err::File::open(&args.input)?, format)?;
    let timeline = config.timeline(&features);
    info!("Epoch is {}, measuring progress in {:?}", timeline.epoch, timeline.unit);

    let symbols = config.symbols();
    let fade_time = symbols
        .get("default")
        .map(|symbol| symbol.cutoff_time)
        .unwrap_or(0.0);
    let mut controller = PlaybackController::new(
        SoftwareRenderer::new(config.pick_radius),
        symbols,
        timeline,
        config.options(),
    );
    controller.attach();
    let events = controller.subscribe();

    // Ingest off the render loop, the same way a slow query would arrive
    let (tx, pending) = ingestion_channel();
    controller.set_source(pending);
    let fields = config.fields();
    let measure_unit = config.measure_unit;
    std::thread::spawn(move || {
        tx.finish(Ok(model::ingest(&features, &fields, timeline, measure_unit)));
    });
    while controller.is_loading() {
        controller.render_frame();
        std::thread::sleep(Duration::from_millis(10));
    }

    let model = controller.model().clone();
    if let Some(path) = args.dump_model {
        fs_err::write(&path, serde_json::to_string_pretty(&*model)?)?;
        info!("Wrote {path}");
    }
    let extent = match model.full_extent() {
        Some(extent) => extent,
        None => {
            warn!("Nothing to replay");
            return Ok(());
        }
    };

    let num_frames = args
        .frames
        .unwrap_or_else(|| ((extent.duration() + fade_time) / args.step).ceil() as usize + 1);
    for frame in 0..num_frames {
        let progress = extent.start + frame as f64 * args.step;
        let instant = controller.timeline().instant_of(progress)?;
        events.unbounded_send(HostEvent::TimeCursorChanged(Some(instant)))?;
        let mut clicked = false;
        for click in args.click.iter().filter(|c| c.frame == frame) {
            events.unbounded_send(HostEvent::Click(click.pt))?;
            clicked = true;
        }

        let stats = controller.render_frame();
        info!(
            "{instant} | pending: {}, moving: {}, stopped: {}, selected: {}",
            stats.pending, stats.moving, stats.stopped, stats.selected
        );
        if clicked {
            let names: Vec<String> = controller
                .selection()
                .iter()
                .filter_map(|id| model.get(id))
                .map(|track| track.name.to_string())
                .collect();
            info!("Selected: [{}]", names.join(", "));
        }
        if stats.unstyled > 0 {
            debug!("{} tracks kept their previous style", stats.unstyled);
        }
    }

    info!(
        "Rendered {} frames of {} tracks",
        controller.renderer().frames(),
        model.len()
    );
    Ok(())
}
