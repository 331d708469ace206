//! Pixelbin CLI
//!
//! Decode and build CDN URLs, sign them, upload files and run predictions.
//! Platform credentials are read from `PIXELBIN_API_TOKEN` (and optionally
//! `PIXELBIN_DOMAIN`, `PIXELBIN_INTEGRATION_PLATFORM`).

use bytes::Bytes;
use bytesize::ByteSize;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use pixelbin::{
    obj_to_url, sign_url, url_to_obj, Access, PixelbinClient, PixelbinConfig, PredictionInput,
    UploadOptions, UploadParams, UrlObject, WaitOptions,
};
use std::path::Path;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn cli() -> Command {
    Command::new("pixelbin")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Pixelbin media platform client")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("decode")
                .about("Parse a CDN URL into its JSON object form")
                .arg(Arg::new("url").help("CDN URL").required(true)),
        )
        .subcommand(
            Command::new("encode")
                .about("Build a CDN URL from its JSON object form")
                .arg(Arg::new("json").help("URL object as JSON").required(true)),
        )
        .subcommand(
            Command::new("sign")
                .about("Sign a CDN URL")
                .arg(Arg::new("url").help("CDN URL").required(true))
                .arg(
                    Arg::new("expiry")
                        .long("expiry")
                        .help("Validity in seconds")
                        .value_parser(value_parser!(u64))
                        .default_value("20"),
                )
                .arg(
                    Arg::new("access-key")
                        .long("access-key")
                        .help("Access key id")
                        .required(true),
                )
                .arg(
                    Arg::new("token")
                        .long("token")
                        .help("Signing token")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("upload")
                .about("Upload a file with chunked multipart upload")
                .arg(Arg::new("file").help("File to upload").required(true))
                .arg(Arg::new("name").long("name").help("Asset name"))
                .arg(Arg::new("path").long("path").help("Destination folder"))
                .arg(Arg::new("format").long("format").help("Asset format"))
                .arg(
                    Arg::new("private")
                        .long("private")
                        .help("Upload with private access")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("tag")
                        .long("tag")
                        .help("Tag to attach (repeatable)")
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("overwrite")
                        .long("overwrite")
                        .help("Overwrite an existing asset")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("chunk-size")
                        .long("chunk-size")
                        .help("Part size, e.g. 10MiB")
                        .default_value("10MiB"),
                )
                .arg(
                    Arg::new("concurrency")
                        .long("concurrency")
                        .help("Parts uploaded concurrently")
                        .value_parser(value_parser!(usize))
                        .default_value("3"),
                )
                .arg(
                    Arg::new("max-retries")
                        .long("max-retries")
                        .help("Retries per part")
                        .value_parser(value_parser!(u32))
                        .default_value("2"),
                ),
        )
        .subcommand(
            Command::new("predict")
                .about("Run a prediction (plugin_operation, e.g. erase_bg)")
                .arg(Arg::new("name").help("Prediction name").required(true))
                .arg(
                    Arg::new("input")
                        .long("input")
                        .help("Input as key=value (repeatable)")
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("file")
                        .long("file")
                        .help("File input as key=path (repeatable)")
                        .action(ArgAction::Append),
                )
                .arg(Arg::new("webhook").long("webhook").help("Webhook URL"))
                .arg(
                    Arg::new("wait")
                        .long("wait")
                        .help("Wait for the job to finish")
                        .action(ArgAction::SetTrue),
                ),
        )
}

fn required<'a>(matches: &'a ArgMatches, id: &str) -> CliResult<&'a String> {
    matches
        .get_one::<String>(id)
        .ok_or_else(|| format!("missing argument <{}>", id).into())
}

fn key_value(raw: &str) -> CliResult<(&str, &str)> {
    raw.split_once('=')
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{}'", raw).into())
}

fn print_json(value: &impl serde::Serialize) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn upload(matches: &ArgMatches) -> CliResult<()> {
    let file = required(matches, "file")?;
    let chunk_size = required(matches, "chunk-size")?
        .parse::<ByteSize>()
        .map_err(|e| format!("invalid chunk size: {}", e))?;

    let mut params = UploadParams::new();
    params.name = matches.get_one::<String>("name").cloned().or_else(|| {
        Path::new(file)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
    });
    params.path = matches.get_one::<String>("path").cloned();
    params.format = matches.get_one::<String>("format").cloned();
    params.tags = matches
        .get_many::<String>("tag")
        .map(|tags| tags.cloned().collect())
        .unwrap_or_default();
    if matches.get_flag("private") {
        params = params.access(Access::Private);
    }
    if matches.get_flag("overwrite") {
        params = params.overwrite(true);
    }

    let options = UploadOptions::new()
        .chunk_size(usize::try_from(chunk_size.as_u64())?)
        .concurrency(matches.get_one::<usize>("concurrency").copied().unwrap_or(3))
        .max_retries(matches.get_one::<u32>("max-retries").copied().unwrap_or(2))
        .on_progress(|progress| {
            eprintln!(
                "part {} done, {} uploaded",
                progress.last_part.unwrap_or_default(),
                ByteSize::b(progress.bytes_uploaded as u64)
            );
        });

    let client = PixelbinClient::new(PixelbinConfig::from_env()?)?;
    let response = client.uploader.upload_file(file, &params, &options).await?;
    print_json(&response)
}

async fn predict(matches: &ArgMatches) -> CliResult<()> {
    let name = required(matches, "name")?;

    let mut input = PredictionInput::new();
    for raw in matches.get_many::<String>("input").into_iter().flatten() {
        let (key, value) = key_value(raw)?;
        input = input.with(key, value);
    }
    for raw in matches.get_many::<String>("file").into_iter().flatten() {
        let (key, path) = key_value(raw)?;
        let data = tokio::fs::read(path).await?;
        let filename = Path::new(path)
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.jpeg", key));
        input = input.file(key, filename, Bytes::from(data));
    }
    let webhook = matches.get_one::<String>("webhook").map(String::as_str);

    let client = PixelbinClient::new(PixelbinConfig::from_env()?)?;
    let job = if matches.get_flag("wait") {
        client
            .predictions
            .create_and_wait(name, &input, webhook, &WaitOptions::default())
            .await?
    } else {
        client.predictions.create(name, &input, webhook).await?
    };
    print_json(&job)
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let matches = cli().get_matches();

    let level = if matches.get_flag("verbose") {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    match matches.subcommand() {
        Some(("decode", sub_matches)) => {
            let obj = url_to_obj(required(sub_matches, "url")?)?;
            print_json(&obj)?;
        }
        Some(("encode", sub_matches)) => {
            let obj: UrlObject = serde_json::from_str(required(sub_matches, "json")?)?;
            println!("{}", obj_to_url(&obj)?);
        }
        Some(("sign", sub_matches)) => {
            let expiry = sub_matches.get_one::<u64>("expiry").copied().unwrap_or(20);
            let signed = sign_url(
                required(sub_matches, "url")?,
                expiry,
                required(sub_matches, "access-key")?,
                required(sub_matches, "token")?,
            )?;
            println!("{}", signed);
        }
        Some(("upload", sub_matches)) => upload(sub_matches).await?,
        Some(("predict", sub_matches)) => predict(sub_matches).await?,
        _ => {
            eprintln!("No subcommand provided. Use --help for usage information.");
            std::process::exit(1);
        }
    }

    Ok(())
}
