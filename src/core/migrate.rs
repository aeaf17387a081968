//! Converts one JSP file to jte and moves every usage over to the new template.
//!
//! Order: read, convert, validate, plan usage rewrites, then write the
//! template, write the rewrites and delete the old file. Nothing is written
//! before conversion and validation succeed.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::convert::{jsp_parser, FormattingConfig, Parser};
use crate::dependencies;
use crate::error::{Error, Result};
use crate::log_status;
use crate::settings::ConverterSettings;
use crate::usages::{self, UsageRewrite};
use crate::utils::case::camel_case_path;
use crate::utils::io;

#[derive(Debug, Clone, Serialize)]
pub struct Migration {
    /// Source file relative to the JSP root.
    pub jsp_file: String,
    /// Target file relative to the jte root.
    pub jte_file: String,
    pub jte_path: String,
    pub usages: UsageRewrite,
    #[serde(skip)]
    pub jte: String,
}

#[derive(Debug, Clone)]
pub struct Migrator {
    jsp_root: PathBuf,
    jte_root: PathBuf,
    jte_tag: String,
    formatting: FormattingConfig,
    not_converted_tags: Vec<String>,
    message_function: String,
}

impl Migrator {
    pub fn new(
        jsp_root: impl Into<PathBuf>,
        jte_root: impl Into<PathBuf>,
        jte_tag: impl Into<String>,
    ) -> Self {
        Self {
            jsp_root: jsp_root.into(),
            jte_root: jte_root.into(),
            jte_tag: jte_tag.into(),
            formatting: FormattingConfig::default(),
            not_converted_tags: Vec::new(),
            message_function: "localize".to_string(),
        }
    }

    pub fn from_settings(settings: &ConverterSettings) -> Self {
        Self::new(
            settings.jsp_root_path(),
            settings.jte_root_path(),
            settings.jte_tag.clone(),
        )
        .with_formatting(settings.formatting())
        .with_not_converted_tags(settings.not_converted_tags.clone())
        .with_message_function(settings.message_function.clone())
    }

    pub fn with_formatting(mut self, formatting: FormattingConfig) -> Self {
        self.formatting = formatting;
        self
    }

    /// Tags (`ns:name`) that may stay unconverted in the output.
    pub fn with_not_converted_tags(mut self, tags: Vec<String>) -> Self {
        self.not_converted_tags = tags;
        self
    }

    pub fn with_message_function(mut self, function: impl Into<String>) -> Self {
        self.message_function = function.into();
        self
    }

    pub fn jsp_root(&self) -> &Path {
        &self.jsp_root
    }

    pub fn jte_root(&self) -> &Path {
        &self.jte_root
    }

    /// A fresh parser with every converter registered and this migrator's formatting.
    pub fn parser(&self) -> Parser {
        let mut parser = jsp_parser(&self.jte_tag, &self.message_function);
        parser.set_formatting(self.formatting.clone());
        parser
    }

    pub fn convert_tag(&self, jsp_tag: &str, jte_tag: &str) -> Result<Migration> {
        self.convert_tag_with(jsp_tag, jte_tag, |_| {})
    }

    /// Like [`Migrator::convert_tag`], with `setup` adjusting the parser first.
    pub fn convert_tag_with<F>(&self, jsp_tag: &str, jte_tag: &str, setup: F) -> Result<Migration>
    where
        F: FnOnce(&mut Parser),
    {
        check_jte_name(jte_tag)?;

        let jsp_path = self.jsp_root.join(jsp_tag);
        let jte_path = self.jte_root.join(jte_tag);

        let mut parser = self.parser();
        setup(&mut parser);
        let jte = self.convert_file(&parser, &jsp_path)?;

        let mut rewrite = self.plan_usages(&jsp_path, &jte_path)?;

        io::write_file(&jte_path, &jte)?;
        log_status!("convert", "Wrote {}", jte_path.display());

        self.finish_usages(&mut rewrite, &jsp_path)?;

        Ok(Migration {
            jsp_file: jsp_tag.replace('\\', "/"),
            jte_file: jte_tag.replace('\\', "/"),
            jte_path: jte_path.display().to_string(),
            usages: rewrite,
            jte,
        })
    }

    /// Convert and validate without writing anything.
    pub fn preview(&self, jsp_tag: &str) -> Result<String> {
        self.convert_file(&self.parser(), &self.jsp_root.join(jsp_tag))
    }

    /// Rewrite usages of `jsp_tag` to `jte_tag` and delete the old file,
    /// without converting it.
    pub fn replace_usages(&self, jsp_tag: &str, jte_tag: &str) -> Result<UsageRewrite> {
        check_jte_name(jte_tag)?;

        let jsp_path = self.jsp_root.join(jsp_tag);
        let jte_path = self.jte_root.join(jte_tag);

        let mut rewrite = self.plan_usages(&jsp_path, &jte_path)?;
        self.finish_usages(&mut rewrite, &jsp_path)?;
        Ok(rewrite)
    }

    /// `args[0]` is the JSP file (absolute or relative to the working
    /// directory); `args[1]`, when present, the target jte file.
    pub fn convert_from_args(&self, args: &[String]) -> Result<Migration> {
        let Some(jsp_arg) = args.first() else {
            return Err(Error::validation_missing_argument(
                vec!["jsp_file".to_string()],
                "Missing JSP file, it should be the first argument on the command line.",
            ));
        };

        let jsp_tag = self.relative_to_jsp_root(Path::new(jsp_arg))?;
        let jte_tag = match args.get(1) {
            Some(jte) => jte.clone(),
            None => suggest_jte_file(&jsp_tag)?,
        };

        self.convert_tag(&jsp_tag, &jte_tag)
    }

    /// Path of `jsp_file` relative to the JSP root, `/`-separated.
    pub fn relative_to_jsp_root(&self, jsp_file: &Path) -> Result<String> {
        let root = io::absolute(&self.jsp_root)?;
        let file = io::absolute(jsp_file)?;
        let relative = file.strip_prefix(&root).map_err(|_| {
            Error::validation_invalid_argument(
                "jsp_file",
                format!("{} is not inside {}", file.display(), root.display()),
                Some(jsp_file.display().to_string()),
            )
        })?;
        Ok(relative.to_string_lossy().replace('\\', "/"))
    }

    fn convert_file(&self, parser: &Parser, jsp_path: &Path) -> Result<String> {
        let source = io::read_file(jsp_path)?;
        log_status!("convert", "Converting {}", jsp_path.display());
        let jte = parser.convert(&source)?;
        dependencies::validate(&jte, &self.not_converted_tags)?;
        Ok(jte)
    }

    fn plan_usages(&self, jsp_path: &Path, jte_path: &Path) -> Result<UsageRewrite> {
        let mapping = usages::tag_prefix_mapping(jsp_path, jte_path, &self.jte_root)?;
        usages::plan_rewrites(&self.jsp_root, jsp_path, &mapping, &self.jte_tag)
    }

    fn finish_usages(&self, rewrite: &mut UsageRewrite, jsp_path: &Path) -> Result<()> {
        usages::apply_rewrites(rewrite, &self.jsp_root)?;

        if jsp_path.exists() {
            io::delete_file(jsp_path)?;
            log_status!("convert", "Deleted {}", jsp_path.display());
            rewrite.deleted = Some(usages::relative_template_path(jsp_path, &self.jsp_root));
        }
        Ok(())
    }
}

/// Target names are jte identifiers; hyphens are not allowed.
pub fn check_jte_name(jte_tag: &str) -> Result<()> {
    if jte_tag.contains('-') {
        return Err(Error::config_illegal_name(jte_tag));
    }
    Ok(())
}

const LAYOUT_DIRS: [&str; 2] = ["layouts/", "layout/"];
const STRIPPED_DIRS: [&str; 4] = ["tags/", "tag/", "layouts/", "layout/"];

/// Conventional jte path for a JSP file.
///
/// `layouts/main.jsp` -> `layout/main.jte`, `my/user-card.tag` ->
/// `tag/my/userCard.jte`, `usage.jsp` -> `usage.jte`.
pub fn suggest_jte_file(jsp_file: &str) -> Result<String> {
    let jsp_file = jsp_file.replace('\\', "/");
    let file_start = jsp_file.rfind('/').map(|i| i + 1).unwrap_or(0);
    let Some(dot) = jsp_file[file_start..].find('.').map(|i| file_start + i) else {
        return Err(Error::validation_invalid_argument(
            "jsp_file",
            format!("{} has no file extension", jsp_file),
            Some(jsp_file.clone()),
        ));
    };

    let stem = &jsp_file[..dot];
    let extension = &jsp_file[dot..];

    let directory = if LAYOUT_DIRS.iter().any(|dir| stem.starts_with(dir)) {
        Some("layout")
    } else if extension != ".jsp" {
        Some("tag")
    } else {
        None
    };

    let stem = STRIPPED_DIRS
        .iter()
        .find_map(|dir| stem.strip_prefix(dir))
        .unwrap_or(stem);
    let stem = camel_case_path(stem);

    Ok(match directory {
        Some(directory) => format!("{}/{}.jte", directory, stem),
        None => format!("{}.jte", stem),
    })
}
