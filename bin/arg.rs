// A module to parse command line arguments

use ::clap::Parser;
use ::std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "pdfdoc",
    version,
    about = "Parses PDF files, summarizes them and optionally writes them back"
)]
pub struct Args {
    #[clap(short, long, help = "Enable verbose output")]
    pub verbose: bool,
    #[clap(short, long, help = "A space-separated list of PDF files")]
    pub files: Vec<PathBuf>,
    #[clap(short, long, help = "The directory containing the PDF files")]
    pub directory: Option<PathBuf>,
    #[clap(
        short,
        long,
        value_name = "DIR",
        help = "Write a re-serialized copy of each file into this directory"
    )]
    pub rewrite: Option<PathBuf>,
    #[clap(long, help = "Pack eligible objects into object streams when rewriting")]
    pub object_streams: bool,
    #[clap(
        long,
        default_value_t = 50,
        help = "The maximum number of objects per object stream"
    )]
    pub objects_per_stream: usize,
}
