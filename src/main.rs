// Copyright 2022 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::{Context, Result};
use clap::Parser;
use lazy_remote_zip::{config::DEFAULT_CHUNK_SIZE, LazyRemoteZipStream, StreamOptions};

/// List the entries of a ZIP file hosted on an HTTP server, fetching only
/// the byte ranges needed to read its central directory.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// URL of the remote zip file. The server must support range requests
    /// and report Content-Length on HEAD.
    #[arg(value_name = "URL")]
    url: String,

    /// Minimum number of bytes fetched per HTTP range request.
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let options = StreamOptions::new().with_chunk_size(args.chunk_size);
    let mut stream = LazyRemoteZipStream::open(&args.url, options)
        .with_context(|| format!("opening {}", args.url))?;
    let total_len = stream.length();

    let mut archive = zip::ZipArchive::new(&mut stream).context("reading central directory")?;
    let file_count = archive.len();
    println!("Zip has {} files", file_count);
    for i in 0..file_count {
        let file = archive.by_index(i).context("reading entry metadata")?;
        println!("Filename: {}", file.name());
    }

    let stats = stream.stats();
    println!(
        "Fetched {} of {} bytes ({:.1}%) across {} request(s), {} bytes served from cache",
        stats.bytes_fetched,
        total_len,
        100.0 * stats.bytes_fetched as f64 / total_len.max(1) as f64,
        stats.requests_issued,
        stats.bytes_served_from_cache,
    );

    Ok(())
}
