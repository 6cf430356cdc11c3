mod arg;
mod fs;
mod summary;

use ::clap::Parser;
use ::env_logger::Builder;
use ::env_logger::Env;
use ::log::error;
use ::log::info;
use ::log::LevelFilter;
use ::pdfdoc::parse::ParseOptions;
use ::pdfdoc::write::WriteOptions;
use ::pdfdoc::Document;
use ::pdfdoc::PdfError;
use ::std::io::Error as IoError;
use ::std::path::Path;
use ::thiserror::Error;

use self::arg::Args;
use self::fs::append_pdf_files;
use self::fs::filter_pdf_files;
use self::fs::rewrite_path;
use self::summary::Summary;

#[derive(Debug, Error)]
enum CliErr {
    #[error("IO. {0}")]
    Io(#[from] IoError),
    #[error("{0}")]
    Pdf(#[from] PdfError),
}

fn init_logger(verbose: bool) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
}

fn process(file: &Path, args: &Args) -> Result<(), CliErr> {
    let buffer = ::std::fs::read(file)?;
    let mut document = Document::load(&buffer, ParseOptions::default())?;
    println!("{}: {}", file.display(), Summary::new(&document));

    if let Some(dir) = &args.rewrite {
        let options = WriteOptions {
            use_object_streams: args.object_streams,
            objects_per_stream: args.objects_per_stream,
            ..Default::default()
        };
        let bytes = document.save(options)?;
        let path = rewrite_path(dir, file);
        ::std::fs::write(&path, bytes)?;
        info!("Wrote {}", path.display());
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logger(args.verbose);

    let mut files = filter_pdf_files(args.files.clone());
    if let Some(dir) = &args.directory {
        append_pdf_files(&mut files, dir);
    }
    if let Some(dir) = &args.rewrite {
        if let Err(err) = ::std::fs::create_dir_all(dir) {
            error!("Failed to create {}. Error: {}", dir.display(), err);
            return;
        }
    }

    for file in files {
        info!("Processing file: {}", file.display());
        if let Err(err) = process(&file, &args) {
            error!("{}: {}", file.display(), err);
        }
    }
}
