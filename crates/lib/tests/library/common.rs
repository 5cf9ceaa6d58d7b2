//! Shared helpers for library integration tests.

use std::fs;
use std::path::Path;

use conveyor_lib::orchestrator::Orchestrator;
use conveyor_lib::taskfile;
use tempfile::TempDir;

/// Taskfile for the picker project, using built-in handlers only.
pub const PICKER_TASKFILE: &str = r#"
manifest: package.json
delimiters:
  curly: ["{%", "%}"]
config:
  dirs:
    site: { src: _source/site, dest: site }
    lib: { src: _source/lib, dest: lib }
  banner:
    js: "/*! <%= pkg.title %> v<%= pkg.version %> | <%= pkg.licenses[0].type %> */\n"
  clean:
    lib: ["<%= dirs.lib.dest %>"]
    site: ["<%= dirs.site.dest %>"]
  concat:
    lib:
      options:
        banner: "<%= banner.js %>(function( $ ) {\n"
        footer: "\n})( jQuery );\n"
      files:
        "<%= dirs.lib.dest %>/<%= pkg.name %>.date.js": ["<%= dirs.lib.src %>/datepicker.js", "<%= dirs.lib.src %>/basepicker.js"]
        "<%= dirs.lib.dest %>/<%= pkg.name %>.time.js": ["<%= dirs.lib.src %>/timepicker.js", "<%= dirs.lib.src %>/basepicker.js"]
  copy:
    lib:
      expand: true
      cwd: "<%= dirs.lib.src %>"
      src: ["translations/*.js"]
      dest: "<%= dirs.lib.dest %>/"
    site:
      options:
        process: { delimiters: curly, exclude: ["**/*.png"] }
      files:
        - { expand: true, cwd: "<%= dirs.site.src %>/", src: ["images/*.png"], dest: "<%= dirs.site.dest %>/" }
        - { "<%= dirs.site.dest %>/index.htm": _source/index.htm }
    pkg:
      files: { "<%= pkg.name %>.jquery.json": package.json }
  watch:
    lib:
      files: ["<%= dirs.lib.src %>/**/*.js"]
      tasks: [build]
aliases:
  build: [clean:lib, concat:lib, copy:lib, copy:pkg]
  site: [clean:site, copy:site]
  default: [build, site]
"#;

pub const PACKAGE_JSON: &str =
  r#"{ "name": "pickadate", "title": "pickadate.js", "version": "3.0.0", "licenses": [{ "type": "MIT" }] }"#;

/// A picker project in a temporary directory.
pub struct Project {
  pub temp: TempDir,
}

impl Project {
  pub fn new(taskfile: &str) -> Self {
    let project = Self {
      temp: TempDir::new().unwrap(),
    };
    project.write("conveyor.yml", taskfile);
    project.write("package.json", PACKAGE_JSON);
    project.write("_source/lib/datepicker.js", "var datepicker = 1;");
    project.write("_source/lib/timepicker.js", "var timepicker = 1;");
    project.write("_source/lib/basepicker.js", "var basepicker = 1;");
    project.write("_source/lib/translations/de_DE.js", "de");
    project.write("_source/lib/translations/fr_FR.js", "fr");
    project.write("_source/index.htm", "<title>{%= pkg.title %}</title><%= keep %>");
    fs::create_dir_all(project.path().join("_source/site/images")).unwrap();
    fs::write(project.path().join("_source/site/images/logo.png"), [0x89, b'{', b'%']).unwrap();
    project
  }

  pub fn picker() -> Self {
    Self::new(PICKER_TASKFILE)
  }

  pub fn path(&self) -> &Path {
    self.temp.path()
  }

  pub fn write(&self, rel: &str, content: &str) {
    let path = self.path().join(rel);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
  }

  pub fn read(&self, rel: &str) -> String {
    fs::read_to_string(self.path().join(rel)).unwrap_or_else(|e| panic!("Failed to read {}: {}", rel, e))
  }

  pub fn exists(&self, rel: &str) -> bool {
    self.path().join(rel).exists()
  }

  pub fn orchestrator(&self) -> Orchestrator {
    taskfile::load(&self.path().join("conveyor.yml"), None).unwrap()
  }
}
