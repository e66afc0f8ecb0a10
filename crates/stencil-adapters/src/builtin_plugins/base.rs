use serde_json::json;

use stencil_core::application::plugin::{PluginGenerator, PluginOptions, PluginResult};
use stencil_core::application::GeneratorApi;

use super::ENTRY_FILE;

const ENTRY: &str = "\
const bodyParser = require('body-parser');
const express = require('express');
const router = require('./router');

const app = express();
const jsonBody = bodyParser.json();

app.use([jsonBody, router]);

app.listen(process.env.PORT || 3000);
";

const ROUTER: &str = "\
const express = require('express');

const router = express.Router();

router.get('/', (req, res) => {
  res.json({ ok: true });
});

module.exports = router;
";

const GITIGNORE: &str = "node_modules\n.env\n";

/// Project skeleton: entry file, router, README and runtime dependencies.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasePlugin;

impl PluginGenerator for BasePlugin {
    fn apply(
        &self,
        api: &mut GeneratorApi<'_>,
        options: &PluginOptions,
        _invoking: bool,
    ) -> PluginResult {
        let name = api.manifest().name().unwrap_or("app").to_owned();
        let port = options.get("port").and_then(|v| v.as_u64()).unwrap_or(3000);

        api.write_file("README.md", format!("# {name}\n\nStart the server with `npm start`.\n"))?;
        api.write_file(".gitignore", GITIGNORE)?;
        api.write_file("src/router.js", ROUTER)?;
        api.write_file(
            ENTRY_FILE,
            ENTRY.replace("process.env.PORT || 3000", &format!("process.env.PORT || {port}")),
        )?;

        api.extend_package(json!({
            "scripts": { "start": "node src/index.js" },
            "dependencies": {
                "body-parser": "^1.20.3",
                "express": "^4.21.0"
            }
        }))?;
        Ok(())
    }
}
