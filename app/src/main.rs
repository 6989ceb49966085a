use anyhow::anyhow;
use clap::{Args, Parser, Subcommand};
use lifesong_audio_file::write_wav_stereo;
use lifesong_core::{Record, Tempo};
use lifesong_osc::{DEFAULT_ADDRESS, OscClient, OscRecordReceiver};
use lifesong_player::Player;
use lifesong_prepare::{current_year, load_facts, prepare};
use lifesong_score::compose;
use lifesong_synth::{RenderConfig, render};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

#[derive(Args)]
struct Output {
    /// Beats per minute. One beat is one year of the life.
    #[arg(long, default_value_t = Tempo::DEFAULT_BPM)]
    bpm: f64,
    /// Sample rate of the WAV file
    #[arg(long, default_value_t = 44_100)]
    sample_rate_hz: u32,
    /// Seed for the noise in the drums
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Also write the performance to this WAV file
    #[arg(long)]
    wav: Option<PathBuf>,
    /// Also write every scheduled event to this JSON file
    #[arg(long)]
    score_json: Option<PathBuf>,
    /// Don't play anything on the audio device
    #[arg(long)]
    silent: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Wait for a record to arrive as OSC messages, then perform it
    Listen {
        #[arg(short, long, default_value = DEFAULT_ADDRESS)]
        bind: String,
        /// Give up if the record is incomplete after this many seconds
        #[arg(long)]
        timeout_s: Option<f64>,
        #[command(flatten)]
        output: Output,
    },
    /// Prepare a record from a facts file and send it to a listening composer
    Send {
        facts: PathBuf,
        #[arg(short, long, default_value = DEFAULT_ADDRESS)]
        server: String,
        /// Year up to which the age of a living person is counted (default: this year)
        #[arg(long)]
        current_year: Option<i32>,
    },
    /// Prepare a record from a facts file and perform it
    Render {
        facts: PathBuf,
        /// Year up to which the age of a living person is counted (default: this year)
        #[arg(long)]
        current_year: Option<i32>,
        #[command(flatten)]
        output: Output,
    },
}

#[derive(Parser)]
#[command(name = "lifesong")]
#[command(about = "Turns the life of one person into a short piece of music")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

fn prepare_record(path: &Path, year: Option<i32>) -> anyhow::Result<Record> {
    let facts = load_facts(path)?;
    if let Some(name) = facts.name.as_deref() {
        log::info!("preparing the life of {}", name);
    }
    let record = prepare(&facts, year.unwrap_or_else(current_year))?;
    log::debug!("{:?}", record);
    Ok(record)
}

fn perform(record: Record, output: &Output) -> anyhow::Result<()> {
    let tempo = Tempo::from_bpm(output.bpm)
        .ok_or_else(|| anyhow!("bpm must be positive (got {})", output.bpm))?;
    let score = compose(record, tempo)?;
    if let Some(path) = output.score_json.as_ref() {
        fs::write(path, serde_json::to_string_pretty(&score)?)?;
        log::info!("wrote {} events to {}", score.events.len(), path.display());
    }
    let render_config = RenderConfig {
        sample_rate_hz: output.sample_rate_hz,
        seed: output.seed,
        ..Default::default()
    };
    if let Some(path) = output.wav.as_ref() {
        let buffer = render(&score, &render_config);
        write_wav_stereo(path, &buffer, render_config.sample_rate_hz)?;
    }
    if !output.silent {
        let player = Player::new()?;
        let config = lifesong_player::Config::default();
        let sample_rate_hz = player.sample_rate_hz(config)?;
        let buffer = render(
            &score,
            &RenderConfig {
                sample_rate_hz,
                ..render_config
            },
        );
        player.play_stereo_buffer(buffer, config)?;
    }
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Listen {
            bind,
            timeout_s,
            output,
        } => {
            let timeout = timeout_s
                .map(Duration::try_from_secs_f64)
                .transpose()
                .map_err(|e| anyhow!("invalid timeout: {e}"))?;
            let mut receiver = OscRecordReceiver::new(bind)?;
            let record = receiver.receive_record(timeout)?;
            perform(record, &output)
        }
        Command::Send {
            facts,
            server,
            current_year,
        } => {
            let record = prepare_record(&facts, current_year)?;
            let client = OscClient::new(server)?;
            client.send_record(&record)
        }
        Command::Render {
            facts,
            current_year,
            output,
        } => {
            let record = prepare_record(&facts, current_year)?;
            perform(record, &output)
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();
    run(Cli::parse())
}
