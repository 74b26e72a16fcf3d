//! Plain-text rendering: banners, summaries, help.

use roster::{compile, Config, FilterSet, PillarCatalog};

/// Terminal width for centered banners: $COLUMNS, falling back to 80.
fn columns() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(80)
}

/// Print `msg` centered in a full-width dashed rule.
pub fn padder(msg: &str) {
    println!("{:-^width$}", msg, width = columns());
}

/// The `?` summary: current directives plus the compiled-query preview.
pub fn summary(filters: &FilterSet, job: Option<&str>) {
    padder("~ Current Summary ~");
    if filters.is_empty() {
        println!("Nothing! Try adding some filters!");
    } else {
        padder(" Current filters to apply: ");
        for entry in filters.entries() {
            println!(" {}", entry);
        }
        cli_equivalent(&compile(filters), "<your command here>");
        padder("");
    }
    if let Some(job) = job {
        println!("Current job id: {}", job);
    }
}

/// The salt invocation equivalent to running `command` right now.
pub fn cli_equivalent(query: &str, command: &str) {
    padder(" CLI equivalent ");
    println!(
        "sudo salt --async -C '{}' cmd.shell '{}'",
        query, command
    );
}

/// Banner for a `.*` pattern: the user asked to match every host.
pub fn match_all_warning() {
    padder(" ! Hey there ! ");
    padder("");
    println!("You just told me to match every host,");
    println!("so here's a big warning on your screen to make sure");
    println!("that's what you intended!");
    padder("");
    padder("");
}

/// List valid pillar keys with their example-value types.
pub fn pillars(catalog: &PillarCatalog) {
    for (type_name, key) in catalog.describe() {
        println!("{} {}", type_name, key);
    }
}

/// Verbose startup dump of the effective configuration.
pub fn config_dump(config: &Config, user: &str) {
    padder(" Configuration ");
    println!("  user = {}", user);
    println!("  history_file = {}", config.history_file);
    println!("  pillar_host = {}", config.pillar_host);
    if let Some(exclude) = &config.pillar_exclude {
        println!("  pillar_exclude = {}", exclude);
    }
    if !config.pillar_map.is_empty() {
        println!("  [pillar_map]");
        for (alias, key) in &config.pillar_map {
            println!("    {} = {}", alias, key);
        }
    }
    padder("");
}

pub fn help() {
    println!(
        r#"muster shell

Query commands:
   ? [jobid]    Display current settings.
                If the optional jobid is supplied, look up that job number.
  ??            Look up the results of the most recently run, or looked up, job.

Targeting/Filtering commands:
   + hostspec   Include this spec as a target.
   - hostspec   Exclude this spec as a target.
   = hostspec   Set the hosts to use, replacing all prior filters.
                Discouraged: past roughly a thousand hosts the backend
                accepts the job and then silently does nothing with it.

   hostspecs are regexes and must match the *entire* hostname you wish
   to target. So '.*fe-web.*', not 'fe-web'. They are passed to the
   backend as-is and it requires this.

Complex Targeting/Filtering:
    (+|-) field (==|!=) value
    The same idea as basic filtering, but targeting on pillar data:

    + status == live    | Include any host whose status is live.
    - env != production | Don't include a host whose env is not production.

    For a list of available pillars, try filtering on one that doesn't
    exist! Running ? after adding filters shows the equivalent CLI
    command, which can make the logic easier to follow.

Special commands:
    .path   Include the file at path, line by line.
    clear   Reset the environment: clears any filters and the job id.
    reset   Same as clear.
    help    This text.
    exit    Leave the shell (quit works too).

Running commands (basically anything else):

   command arg1 arg2 arg3
"#
    );
}

pub fn meow() {
    println!(
        r#"
      |\      _,,,---,,_
ZZZzz /,`.-'`'    -.  ;-;;,_
     |,4-  ) )-,_. ,\ (  `'-'
    '---''(_/--'  `-'\_)
"#
    );
}
