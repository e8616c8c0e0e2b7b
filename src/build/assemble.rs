//! Target assembly: the manifest pair and emitted sources for one version.
//!
//! Layout under the build directory:
//!
//! ```text
//! build/
//!   Bagger_Classic.toc      manifest, one per target
//!   sourceClassic.xml       import manifest, one per target
//!   src/Core.lua            processed sources, shared by all targets
//! ```

use crate::build::BuildTarget;
use crate::config::WowluaConfig;
use crate::source::SourceFile;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Subdirectory of the build directory holding emitted sources.
pub const SOURCE_DIR: &str = "src";

const UI_OPEN: &str = r#"<Ui xmlns="http://www.blizzard.com/wow/ui/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://www.blizzard.com/wow/ui/ ..\FrameXML\UI.xsd">"#;

/// Render the `.toc` manifest for a target.
pub fn render_toc(config: &WowluaConfig, target: &BuildTarget) -> String {
    let project = &config.project;
    let mut toc = String::new();
    toc.push_str(&format!("## Interface: {}\n", target.interface));
    toc.push_str(&format!("## Title: {}\n", project.name));
    toc.push_str(&format!("## Notes: {}\n", project.description));
    toc.push_str(&format!("## Author: {}\n", project.author));
    toc.push_str(&format!("## Version: {}\n", project.version));
    if !project.saved_variables.is_empty() {
        toc.push_str(&format!("## SavedVariables: {}\n", project.saved_variables.join(", ")));
    }
    toc.push('\n');
    toc.push_str(&target.xml_name());
    toc.push('\n');
    toc
}

/// Render the import manifest listing `files` in order.
pub fn render_xml(files: &[SourceFile]) -> String {
    let mut xml = String::from(UI_OPEN);
    xml.push('\n');
    for file in files {
        xml.push_str(&format!(
            "    <Script file=\"{}/{}\" />\n",
            SOURCE_DIR,
            escape_attribute(&file.file_name)
        ));
    }
    xml.push_str("</Ui>\n");
    xml
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Write the artifacts of one target.
///
/// `files` is the resolved build order; files not applicable to the target
/// are skipped. Returns the written paths: manifest, import manifest, then
/// sources.
pub fn assemble(
    config: &WowluaConfig,
    target: &BuildTarget,
    files: &[SourceFile],
    out_dir: &Path,
) -> io::Result<Vec<PathBuf>> {
    let files: Vec<SourceFile> = files.iter().filter(|f| target.includes(f)).cloned().collect();
    fs::create_dir_all(out_dir)?;

    let mut outputs = Vec::with_capacity(files.len() + 2);

    let toc_path = out_dir.join(target.toc_name(&config.project.name));
    fs::write(&toc_path, render_toc(config, target))?;
    outputs.push(toc_path);

    let xml_path = out_dir.join(target.xml_name());
    fs::write(&xml_path, render_xml(&files))?;
    outputs.push(xml_path);

    let source_dir = out_dir.join(SOURCE_DIR);
    for file in &files {
        let path = source_dir.join(&file.file_name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, file.processed_text())?;
        outputs.push(path);
    }

    tracing::debug!("assembled {} with {} files", target.id(), files.len());
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::globals::KnownGlobals;
    use crate::version::GameVersion;
    use tempfile::TempDir;

    fn config() -> WowluaConfig {
        let mut config = WowluaConfig::default();
        config.project.name = "Bagger".into();
        config.project.version = "1.0.0".into();
        config.project.author = "Someone".into();
        config.project.description = "Bags".into();
        config
    }

    fn classic() -> BuildTarget {
        BuildTarget::new(GameVersion::Classic, "11306", KnownGlobals::new())
    }

    #[test]
    fn test_render_toc() {
        let toc = render_toc(&config(), &classic());
        assert_eq!(
            toc,
            "## Interface: 11306\n## Title: Bagger\n## Notes: Bags\n## Author: Someone\n## Version: 1.0.0\n\nsourceClassic.xml\n"
        );
    }

    #[test]
    fn test_render_toc_saved_variables() {
        let mut config = config();
        config.project.saved_variables = vec!["BaggerDB".into(), "BaggerCharDB".into()];
        let toc = render_toc(&config, &classic());
        assert!(toc.contains("## SavedVariables: BaggerDB, BaggerCharDB\n"));
    }

    #[test]
    fn test_render_xml_in_order() {
        let files = vec![SourceFile::new("/src", "A.lua", ""), SourceFile::new("/src", "ui/B&C.lua", "")];
        let xml = render_xml(&files);
        let lines: Vec<&str> = xml.lines().collect();

        assert_eq!(lines[0], UI_OPEN);
        assert_eq!(lines[1], r#"    <Script file="src/A.lua" />"#);
        assert_eq!(lines[2], r#"    <Script file="src/ui/B&amp;C.lua" />"#);
        assert_eq!(lines[3], "</Ui>");
    }

    #[test]
    fn test_assemble_writes_artifacts() {
        let temp = TempDir::new().unwrap();
        let mut retail_only = SourceFile::new("/src", "Retail.lua", "r = 1");
        retail_only.restrict_to([GameVersion::Retail]);
        let files = vec![SourceFile::new("/src", "Core.lua", "c = 1"), retail_only];

        let outputs = assemble(&config(), &classic(), &files, temp.path()).unwrap();
        assert_eq!(outputs.len(), 3);
        assert!(temp.path().join("Bagger_Classic.toc").exists());
        assert_eq!(fs::read_to_string(temp.path().join("src/Core.lua")).unwrap(), "c = 1");
        assert!(!temp.path().join("src/Retail.lua").exists());

        let xml = fs::read_to_string(temp.path().join("sourceClassic.xml")).unwrap();
        assert!(!xml.contains("Retail.lua"));
    }
}
