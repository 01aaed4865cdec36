//! Common test utilities for integration tests

use std::fs;
use std::io::Write;
use std::path::Path;

/// Helper function to create a test file, creating parent directories
#[allow(dead_code)]
pub fn create_test_file(path: &Path, content: &str) {
    let parent = path.parent().unwrap();
    fs::create_dir_all(parent).unwrap();
    fs::File::create(path)
        .unwrap()
        .write_all(content.as_bytes())
        .unwrap();
}

/// Sample grants as saved by an earlier search
#[allow(dead_code)]
pub const SAMPLE_GRANTS_JSON: &str = r#"{
  "grants": [
    {
      "title": "Ayudas a la digitalización de PYMES en Madrid",
      "description": "Apoyo a la transformación digital",
      "sector": "Tecnología",
      "location": "Madrid",
      "region": "Madrid",
      "company_type": "PYME",
      "amount": "Hasta 1.500.000€",
      "deadline": "2024-06-05",
      "publication_date": "2024-05-30",
      "source": "BOE - Boletín Oficial del Estado",
      "link": "https://www.boe.es/diario_boe/txt.php?id=BOE-B-2024-1"
    },
    {
      "title": "Programa NEOTEC",
      "description": "Creación y consolidación de empresas de base tecnológica",
      "location": "España",
      "region": "Todas",
      "amount": "Hasta 250.000€",
      "deadline": "2024-08-30",
      "publication_date": "2024-04-01",
      "source": "CDTI - Centro para el Desarrollo Tecnológico Industrial"
    },
    {
      "title": "Subvenciones al comercio en Sevilla",
      "location": "Sevilla",
      "region": "Andalucía",
      "amount": "Consultar convocatoria",
      "deadline": "2024-07-10",
      "publication_date": "2024-05-28",
      "source": "BOE - Boletín Oficial del Estado"
    },
    {
      "title": "Horizon Europe - Cluster 5",
      "location": "Unión Europea",
      "amount": "Hasta 5 millones",
      "deadline": "2024-09-15",
      "publication_date": "2024-03-01",
      "source": "EU Funding & Tenders Portal"
    },
    {
      "title": "Fondo Mundial de Innovación",
      "location": "Internacional",
      "deadline": "2024-05-01",
      "source": "Banco Mundial"
    },
    {
      "title": "Convocatoria sin ubicación"
    }
  ]
}"#;
