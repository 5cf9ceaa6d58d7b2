//! Embedded starter files for `conveyor init`.

/// Starter taskfile for a jQuery plugin laid out as `_source/` → `lib/` and
/// `site/`. The compilers, linters, minifiers and test runner are external
/// programs run through `exec`.
pub const TASKFILE_TEMPLATE: &str = r#"# Build configuration for the date/time picker.
#
#   conveyor run            # default: everything
#   conveyor run build      # the library, tested
#   conveyor run site       # the documentation site
#   conveyor watch          # rebuild on change

manifest: package.json

delimiters:
  # Site templates are processed with {%= %} so that <%= %> survives.
  curly: ["{%", "%}"]

plugins:
  sass: exec
  jshint: exec
  qunit: exec
  uglify: exec
  cssmin: exec

config:
  dirs:
    site: { src: _source/site, dest: site }
    lib: { src: _source/lib, dest: lib }
    tests: _tests/qunit

  banner:
    js: |
      /*!
       * <%= pkg.title %> v<%= pkg.version %>, <%= today("yyyy-mm-dd") %>
       * By <%= pkg.author.name %> (<%= pkg.author.url %>)
       * Hosted on <%= pkg.homepage %>
       * Licensed under <%= pkg.licenses[0].type %>
       */
    css: "/*!\n * <%= pkg.title %> v<%= pkg.version %>, <%= today(\"yyyy-mm-dd\") %>\n * <%= pkg.homepage %> : <%= task.current.filesSrc %>\n */\n"

  clean:
    lib: ["<%= dirs.lib.dest %>"]

  copy:
    site:
      options:
        process: { delimiters: curly, exclude: ["**/*.{png,ico}"] }
      files:
        - { expand: true, cwd: "<%= dirs.site.src %>/", src: ["images/*.{png,ico}"], dest: "<%= dirs.site.dest %>/" }
        - { index.htm: _source/index.htm }
    lib:
      expand: true
      cwd: "<%= dirs.lib.src %>"
      src: ["translations/*.js"]
      dest: "<%= dirs.lib.dest %>/"
    pkg:
      files: { "<%= pkg.name %>.jquery.json": package.json }

  sass:
    options:
      command: [sass, "--style=expanded", "--no-source-map", "{src}", "{dest}"]
    site:
      files: { "<%= dirs.site.dest %>/styles/main.css": "<%= dirs.site.src %>/styles/base.scss" }
    lib:
      files: { "<%= dirs.lib.dest %>/themes/default.css": "<%= dirs.lib.src %>/themes/default.scss" }

  concat:
    site:
      files: { "<%= dirs.site.dest %>/scripts/main.js": "<%= dirs.site.src %>/scripts/*.js" }
    lib:
      options:
        banner: "<%= banner.js %>\n(function( $, document, undefined ) {\"use strict\";"
        footer: "})( jQuery, document );"
      files:
        "<%= dirs.lib.dest %>/<%= pkg.name %>.datetime.js":
          - "<%= dirs.lib.src %>/datepicker.js"
          - "<%= dirs.lib.src %>/timepicker.js"
          - "<%= dirs.lib.src %>/basepicker.js"
        "<%= dirs.lib.dest %>/<%= pkg.name %>.date.js":
          - "<%= dirs.lib.src %>/datepicker.js"
          - "<%= dirs.lib.src %>/basepicker.js"
        "<%= dirs.lib.dest %>/<%= pkg.name %>.time.js":
          - "<%= dirs.lib.src %>/timepicker.js"
          - "<%= dirs.lib.src %>/basepicker.js"

  jshint:
    options:
      command: [jshint, "{srcs}"]
    site: ["<%= dirs.site.src %>/scripts/*.js"]
    lib:
      - "<%= dirs.lib.dest %>/**/*.js"
      - "!<%= dirs.lib.dest %>/**/*.min.js"
      - "<%= dirs.tests %>/tests.js"

  qunit:
    options:
      command: [node-qunit-puppeteer, "{src}"]
    lib: ["<%= dirs.tests %>/qunit.htm"]

  uglify:
    options:
      # Keep /*! ... */ banners.
      command: [uglifyjs, "{src}", "--comments", "-o", "{dest}"]
    lib:
      files:
        "<%= dirs.lib.dest %>/<%= pkg.name %>.datetime.min.js": ["<%= dirs.lib.dest %>/<%= pkg.name %>.datetime.js"]
        "<%= dirs.lib.dest %>/<%= pkg.name %>.date.min.js": ["<%= dirs.lib.dest %>/<%= pkg.name %>.date.js"]
        "<%= dirs.lib.dest %>/<%= pkg.name %>.time.min.js": ["<%= dirs.lib.dest %>/<%= pkg.name %>.time.js"]
    legacy:
      files:
        "<%= dirs.lib.dest %>/<%= pkg.name %>-legacy.js": ["<%= dirs.lib.src %>/legacy.js"]

  cssmin:
    options:
      command: [cleancss, "-o", "{dest}", "{src}"]
    lib:
      options:
        banner: "<%= banner.css %>"
      expand: true
      cwd: "<%= dirs.lib.dest %>"
      src: ["themes/*.css", "!themes/*.min.css"]
      dest: "<%= dirs.lib.dest %>/"
      ext: .min.css

  watch:
    site:
      files:
        - "<%= dirs.site.src %>/../*.htm"
        - "<%= dirs.site.src %>/styles/*.scss"
        - "<%= dirs.site.src %>/scripts/*.js"
      tasks: [site]
    lib:
      files:
        - "<%= dirs.lib.src %>/**/*.js"
        - "<%= dirs.lib.src %>/themes/*.scss"
      tasks: [build]

aliases:
  default: [clean, concat, copy, sass, jshint, uglify, cssmin]
  build: [clean:lib, concat:lib, copy:lib, sass:lib, jshint:lib, qunit:lib, uglify:lib, cssmin:lib]
  site: [jshint:site, concat:site, copy:site, sass:site]
  travis: [concat, copy, sass, jshint, qunit, uglify, cssmin]
"#;
