use std::{error::Error, io::Write, path::PathBuf};

use clap::Parser;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Options {
    /// HTML file to enhance
    #[clap(name = "input")]
    input_file: PathBuf,

    /// HTML file to write to, or 'stdout' (default: <input>.out.html)
    #[clap(short, long, name = "output")]
    output_file: Option<PathBuf>,

    /// Language for the brush annotation on pre.code blocks
    #[clap(short, long, default_value = "clojure")]
    brush: String,

    /// Number the lines of highlighted blocks
    #[clap(long)]
    gutter: bool,

    /// Emit a toolbar placeholder above highlighted blocks
    #[clap(long)]
    toolbar: bool,

    /// Skip the light theme class on highlighted blocks
    #[clap(long = "no-light")]
    no_light: bool,

    /// Print a JSON run report to stdout
    #[clap(long)]
    report: bool,

    /// Show times
    #[clap(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let opts = Options::parse();

    let source = std::fs::read_to_string(&opts.input_file)?;

    let mut output_writer = if let Some(ref path) = opts.output_file {
        if path == &PathBuf::from("stdout") {
            Box::new(std::io::stdout()) as Box<dyn Write>
        } else {
            Box::new(std::fs::File::create(path)?) as Box<dyn Write>
        }
    } else {
        let stem_opt = opts.input_file.file_stem();
        if let Some(stem) = stem_opt {
            let stem = stem
                .to_str()
                .ok_or("input filename is not valid unicode")?
                .to_owned();
            Box::new(std::fs::File::create(stem + ".out.html")?) as Box<dyn Write>
        } else {
            return Err("default output file (<input>.out.html) expects a filename with a stem".into());
        }
    };

    let highlight = luster::HighlightOptions {
        gutter: opts.gutter,
        toolbar: opts.toolbar,
        light: !opts.no_light,
    };
    let options = luster::EnhanceOptions::new(opts.brush.clone(), highlight);

    let time_setup_start = std::time::Instant::now();
    let mut enhancer = luster::Enhancer::new(options)?;
    let setup_elapsed = time_setup_start.elapsed();
    if opts.verbose {
        println!("engine setup time: {:?}", setup_elapsed);
    }

    let time_enhance_start = std::time::Instant::now();
    let stats = enhancer.enhance(&source, &mut output_writer)?;
    let enhance_elapsed = time_enhance_start.elapsed();
    if opts.verbose {
        println!("enhance time: {:?}", enhance_elapsed);
    }

    log::info!(
        "{}: {} timestamps formatted, {} code blocks highlighted",
        opts.input_file.display(),
        stats.timestamps_formatted,
        stats.blocks_highlighted
    );

    if opts.report {
        println!("{}", serde_json::to_string(&stats)?);
    }

    Ok(())
}
