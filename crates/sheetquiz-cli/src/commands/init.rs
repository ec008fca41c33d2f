//! The `sheetquiz init` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use sheetquiz_sources::config::LOCAL_CONFIG_FILE;

const EXAMPLE_BANK: &str = "questions.csv";

pub fn execute(dir: PathBuf) -> Result<()> {
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    write_once(&dir.join(LOCAL_CONFIG_FILE), SAMPLE_CONFIG)?;
    write_once(&dir.join(EXAMPLE_BANK), EXAMPLE_QUESTIONS)?;

    println!("\nNext steps:");
    println!("  1. Point default_source in {LOCAL_CONFIG_FILE} at your sheet or CSV");
    println!("  2. Run: sheetquiz validate --source {EXAMPLE_BANK}");
    println!("  3. Run: sheetquiz run --source {EXAMPLE_BANK}");
    Ok(())
}

fn write_once(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
        return Ok(());
    }
    std::fs::write(path, content)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Created {}", path.display());
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# sheetquiz configuration

# Sheet link, CSV URL, or local path used when --source is omitted.
default_source = "questions.csv"

default_mode = "learning"   # learning | timed
time_limit_minutes = 15
# question_limit = 20
shuffle = true
layout = "single"           # single | list
theme = "light"             # light | dark
output_dir = "./sheetquiz-results"
"#;

const EXAMPLE_QUESTIONS: &str = "\
module,submodule,question,option_a,option_b,option_c,option_d,correct,explanation,difficulty,tags
Networking,DNS,Which record type maps a name to an IPv4 address?,A,AAAA,CNAME,MX,a,AAAA is for IPv6.,easy,dns;basics
Networking,DNS,Which record type delegates a zone?,NS,SOA,TXT,PTR,a,,medium,dns
Networking,TCP,How many packets make up the TCP handshake?,Two,Three,Four,,b,SYN then SYN-ACK then ACK.,easy,tcp
Storage,Disks,Which RAID level mirrors without striping?,RAID 0,RAID 1,RAID 5,RAID 6,b,,easy,raid
Storage,Backups,What does RPO measure?,Acceptable data loss,Restore duration,Disk throughput,,a,Recovery point objective.,medium,backups;dr
";
