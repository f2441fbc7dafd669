extern crate clap;

use clap::{value_t, App, AppSettings, Arg, SubCommand};

use fmpextract::defaultlogger::register_messenger_default;
use fmpextract::extract::{run_extract, ExtractConfig, ExtractOptions, StyleConfig};
use fmpextract::mercator::Bbox;

use std::io::{Error, ErrorKind, Result};

fn run_extract_w(
    indir: &str,
    prefix: Option<&str>,
    bbox: &str,
    outdir: Option<&str>,
    rules_fn: Option<&str>,
    styles_fn: Option<&str>,
    render: bool,
    numchan: usize,
) -> Result<()> {
    let bbox = Bbox::from_str(bbox)?;

    let prefix_ = match prefix {
        Some(p) => String::from(p),
        None => match std::path::Path::new(indir).file_name() {
            Some(n) => String::from(n.to_string_lossy()),
            None => {
                return Err(Error::new(ErrorKind::Other, "can't derive prefix from INDIR"));
            }
        },
    };

    let rules = match rules_fn {
        Some(f) => ExtractConfig::from_file(f)?,
        None => ExtractConfig::default(),
    };
    let styles = match styles_fn {
        Some(f) => StyleConfig::from_file(f)?,
        None => StyleConfig::default(),
    };

    let opts = ExtractOptions {
        outdir: String::from(outdir.unwrap_or(indir)),
        render: render,
        numchan: numchan,
    };

    run_extract(indir, &prefix_, &bbox, &rules, &styles, &opts)?;
    Ok(())
}

fn dump_style(rules_fn: Option<&str>, styles_fn: Option<&str>) -> Result<()> {
    let rules_fn = rules_fn.unwrap_or("extract_rules.json");
    let styles_fn = styles_fn.unwrap_or("style_rules.json");

    let mut f = std::fs::File::create(rules_fn)?;
    serde_json::to_writer_pretty(&mut f, &ExtractConfig::default())?;
    let mut f = std::fs::File::create(styles_fn)?;
    serde_json::to_writer_pretty(&mut f, &StyleConfig::default())?;
    println!("wrote {} and {}", rules_fn, styles_fn);
    Ok(())
}

fn main() {
    let mut app = App::new("fmpextract")
        .version("0.1")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("extract")
                .about("clips styled features from geojson extracts into .fmp map blocks")
                .arg(Arg::with_name("INDIR").required(true).help("directory containing <PREFIX>_lines.geojson and <PREFIX>_polygons.geojson"))
                .arg(Arg::allow_hyphen_values(Arg::with_name("BBOX").short("-b").long("--bbox").required(true).takes_value(true).help("bounding box MINLON,MINLAT,MAXLON,MAXLAT in degrees"), true))
                .arg(Arg::with_name("PREFIX").short("-p").long("--prefix").takes_value(true).help("dataset name prefix, defaults to the INDIR directory name"))
                .arg(Arg::with_name("OUTDIR").short("-o").long("--outdir").takes_value(true).help("map output folder, defaults to INDIR"))
                .arg(Arg::with_name("RENDER").short("-r").long("--render").help("also writes a debug png for each non empty block"))
                .arg(Arg::with_name("NUMCHAN").short("-n").long("--numchan").takes_value(true).help("uses NUMCHAN parallel threads"))
                .arg(Arg::with_name("RULES").long("--rules").takes_value(true).help("extract rules json, defaults to the built in table"))
                .arg(Arg::with_name("STYLES").long("--styles").takes_value(true).help("style rules json, defaults to the built in table"))
        )
        .subcommand(
            SubCommand::with_name("dump_style")
                .about("writes the built in extract and style tables as json")
                .arg(Arg::with_name("RULES").long("--rules").takes_value(true).help("rules output filename, defaults to extract_rules.json"))
                .arg(Arg::with_name("STYLES").long("--styles").takes_value(true).help("styles output filename, defaults to style_rules.json"))
        );

    let mut help = Vec::new();
    app.write_help(&mut help).expect("?");

    register_messenger_default().expect("!!");

    let numchan_default = num_cpus::get();

    let res = match app.get_matches().subcommand() {
        ("extract", Some(ext)) => run_extract_w(
            ext.value_of("INDIR").unwrap(),
            ext.value_of("PREFIX"),
            ext.value_of("BBOX").unwrap(),
            ext.value_of("OUTDIR"),
            ext.value_of("RULES"),
            ext.value_of("STYLES"),
            ext.is_present("RENDER"),
            value_t!(ext, "NUMCHAN", usize).unwrap_or(numchan_default),
        ),
        ("dump_style", Some(ds)) => dump_style(ds.value_of("RULES"), ds.value_of("STYLES")),
        _ => Err(Error::new(ErrorKind::Other, "??")),
    };

    match res {
        Ok(()) => {}
        Err(err) => {
            println!("FAILED: {}", err);
            println!("{}", String::from_utf8(help).unwrap());
            std::process::exit(1);
        }
    }
}
