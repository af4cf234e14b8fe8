//! Stage 1: project scaffold
//!
//! Allocates the timestamped project directory with the fixed subtree,
//! generates database credentials, and writes the static files every
//! generated project starts from. The handle is returned through state so
//! later stages never have to rediscover it.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use srs_forge_sdk::log_state_file;
use uuid::Uuid;

use crate::pipeline::generate::write_file;
use crate::pipeline::types::{keys, PipelineState, Stage, StageContext, StageUpdate};

pub struct ScaffoldStage;

const STAGE: usize = 1;

#[async_trait]
impl Stage for ScaffoldStage {
    fn name(&self) -> &'static str {
        "scaffold"
    }

    async fn run(&self, _state: &PipelineState, ctx: &StageContext) -> Result<StageUpdate> {
        let handle = ctx.workspace.create()?;
        println!("🚀 Creating: {}", handle.name);

        let db_user = ctx.config.db_user.clone();
        let db_password = Uuid::new_v4().simple().to_string();
        let db_name = ctx.config.db_name.clone();

        write_file(
            &handle.join(".env"),
            &format!(
                "DATABASE_URL=postgresql://{}:{}@localhost:5432/{}",
                db_user, db_password, db_name
            ),
        )?;
        write_file(
            &handle.join("requirements.txt"),
            &[
                "fastapi",
                "uvicorn",
                "psycopg2-binary",
                "alembic",
                "sqlalchemy",
                "python-dotenv",
            ]
            .join("\n"),
        )?;
        write_file(&handle.join("README.md"), &format!("# {}\n\n", handle.name))?;
        write_file(&handle.join("app/main.py"), APP_MAIN_PY)?;
        write_file(&handle.join("app/database.py"), APP_DATABASE_PY)?;
        write_file(&handle.join("app/api/routes/__init__.py"), "")?;
        write_file(&handle.join("app/models/__init__.py"), "")?;

        log_state_file!(STAGE, handle.root.display(), "Project scaffold created");

        Ok(StageUpdate::new()
            .with(keys::PROJECT_NAME, json!(handle.name))
            .with(keys::PROJECT_DIR, json!(handle.root.display().to_string()))
            .with(keys::DB_USER, json!(db_user))
            .with(keys::DB_PASSWORD, json!(db_password))
            .with(keys::DB_NAME, json!(db_name)))
    }
}

const APP_MAIN_PY: &str = r#"from fastapi import FastAPI

app = FastAPI()

@app.get("/")
def read_root():
    return {"message": "Welcome to your FastAPI app!"}
"#;

const APP_DATABASE_PY: &str = r#"from sqlalchemy import create_engine
from sqlalchemy.ext.declarative import declarative_base
from sqlalchemy.orm import sessionmaker
import os
from dotenv import load_dotenv

load_dotenv()
DATABASE_URL = os.getenv("DATABASE_URL")
engine = create_engine(DATABASE_URL)
SessionLocal = sessionmaker(autocommit=False, autoflush=False, bind=engine)
Base = declarative_base()
"#;
