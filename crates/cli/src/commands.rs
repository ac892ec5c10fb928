use clap::{Args, Subcommand};

#[derive(Subcommand)]
pub enum Commands {
    /// Decode a payload and report the fields it references
    Check {
        #[command(flatten)]
        filter: FilterSource,
    },
    /// Compile a payload into a parameterised WHERE fragment
    Compile {
        #[command(flatten)]
        filter: FilterSource,

        #[command(flatten)]
        settings: SettingsSource,

        #[arg(long, help = "Table the fields belong to")]
        table: String,

        #[arg(long, help = "Schema that qualifies the table")]
        schema: Option<String>,

        #[arg(long, help = "Alias used to qualify every column")]
        alias: Option<String>,

        #[arg(
            long,
            value_delimiter = ',',
            required = true,
            help = "Filterable columns; `field=column` exposes a column under another name"
        )]
        columns: Vec<String>,

        #[arg(long, default_value = "postgres", help = "SQL dialect: postgres or mysql")]
        dialect: String,

        #[arg(long, help = "Print full list and count queries instead of the bare predicate")]
        select: bool,

        #[arg(long, help = "Evaluation instant (RFC 3339), defaults to now")]
        now: Option<String>,
    },
    /// Apply a payload to a JSON array of records
    Eval {
        #[command(flatten)]
        filter: FilterSource,

        #[command(flatten)]
        settings: SettingsSource,

        #[arg(long, help = "JSON file holding an array of objects")]
        records: String,

        #[arg(long, help = "Evaluation instant (RFC 3339), defaults to now")]
        now: Option<String>,

        #[arg(
            long,
            help = "If specified, writes the matching records to this file instead of stdout"
        )]
        output: Option<String>,
    },
    /// Re-encode a payload with the widget's canonical tokens
    Normalize {
        #[command(flatten)]
        filter: FilterSource,
    },
}

#[derive(Args)]
pub struct FilterSource {
    #[arg(long, conflicts_with = "filter_file", help = "filterSos payload as inline JSON")]
    pub filter: Option<String>,

    #[arg(long, help = "File holding the filterSos payload")]
    pub filter_file: Option<String>,
}

#[derive(Args)]
pub struct SettingsSource {
    #[arg(long, help = "JSON file with timezone, week_start and null_check")]
    pub settings: Option<String>,

    #[arg(long, help = "A .env file whose values take precedence over the process environment")]
    pub env_file: Option<String>,
}
