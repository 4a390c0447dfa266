use anyhow::Result;
use std::path::PathBuf;

/// Settings the user expects to survive a restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub coder_name: String,
    /// Scroll the transcript along with playback.
    pub scroll_transcript: bool,
    pub black_and_white_graph: bool,
    pub larger_category_font: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            coder_name: "default".to_string(),
            scroll_transcript: true,
            black_and_white_graph: false,
            larger_category_font: false,
        }
    }
}

/// On-disk form of [Settings]. When the structure changes it must get a new
/// version so files saved by older builds still load.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum PersistentData {
    V1(PersistentDataV1),
    V2(PersistentDataV2),
}

impl Default for PersistentData {
    fn default() -> Self {
        PersistentData::V2(PersistentDataV2::default())
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PersistentDataV1 {
    coder_name: String,
    scroll_transcript: bool,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PersistentDataV2 {
    coder_name: String,
    scroll_transcript: bool,
    black_and_white_graph: bool,
    larger_category_font: bool,
}

impl Default for PersistentDataV2 {
    fn default() -> Self {
        let settings = Settings::default();
        PersistentDataV2 {
            coder_name: settings.coder_name,
            scroll_transcript: settings.scroll_transcript,
            black_and_white_graph: settings.black_and_white_graph,
            larger_category_font: settings.larger_category_font,
        }
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let data = PersistentData::V2(PersistentDataV2 {
        coder_name: settings.coder_name.clone(),
        scroll_transcript: settings.scroll_transcript,
        black_and_white_graph: settings.black_and_white_graph,
        larger_category_font: settings.larger_category_font,
    });
    write_data(&data)
}

pub fn load_settings(settings: &mut Settings) -> Result<()> {
    let data = read_data()?;
    *settings = match data {
        // V1 predates the graph display options.
        PersistentData::V1(data) => Settings {
            coder_name: data.coder_name,
            scroll_transcript: data.scroll_transcript,
            black_and_white_graph: false,
            larger_category_font: false,
        },
        PersistentData::V2(data) => Settings {
            coder_name: data.coder_name,
            scroll_transcript: data.scroll_transcript,
            black_and_white_graph: data.black_and_white_graph,
            larger_category_font: data.larger_category_font,
        },
    };
    Ok(())
}

fn write_data(data: &PersistentData) -> Result<()> {
    let settings_file = settings_file_path();
    println!("Writing settings to {}", settings_file.display());

    std::fs::create_dir_all(settings_folder())?;

    // Write to a temporary file first and move it into place, so a crash
    // mid-write leaves the previous settings intact.
    let write_file_path = temporary_write_file_path();
    let mut file = std::fs::File::create(&write_file_path)?;
    serde_json::to_writer_pretty(&mut file, &data)?;
    file.sync_all()?;

    std::fs::rename(&write_file_path, settings_file)?;

    Ok(())
}

fn read_data() -> Result<PersistentData> {
    let path = settings_file_path();
    println!("Reading settings from {}", path.display());
    if !path.try_exists()? {
        println!("File not found, using default settings");
        return Ok(PersistentData::default());
    }
    let file = std::fs::File::open(&path)?;
    let data: PersistentData = serde_json::from_reader(file)?;
    Ok(data)
}

fn settings_folder() -> PathBuf {
    directories::ProjectDirs::from("org", "qoda", "qoda")
        .unwrap()
        .data_dir()
        .to_path_buf()
}

fn settings_file_path() -> PathBuf {
    settings_folder().join("settings.json")
}

fn temporary_write_file_path() -> PathBuf {
    let random_number: u64 = rand::random();
    settings_folder().join(format!("temporary_settings{}.json", random_number))
}
