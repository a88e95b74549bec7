//! Technical and merge-readiness checklists per project category.
//!
//! Everything category-specific lives in [`PROFILES`]; the functions below
//! only interpret that table.

use tracing::debug;

use prgen_shared::ProjectCategory;

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// A technical checklist entry and the `--stat` keywords that tick it.
#[derive(Debug)]
struct TechnicalRule {
    label: &'static str,
    keywords: &'static [&'static str],
}

/// Checklist content for one category.
#[derive(Debug)]
struct Profile {
    category: ProjectCategory,
    technical: &'static [TechnicalRule],
    merge: &'static str,
}

const PROFILES: &[Profile] = &[
    Profile {
        category: ProjectCategory::Laravel,
        technical: &[
            TechnicalRule {
                label: "Nuevo endpoint en el controlador `PermissionController` (o lógica backend)",
                keywords: &["controller", "route", "api.php", "web.php", "trait", "service", "request"],
            },
            TechnicalRule {
                label: "Modificación de la base de datos (nueva migración)",
                keywords: &["migration", "schema", "model", "database", "pivot"],
            },
            TechnicalRule {
                label: "Actualización de pruebas unitarias e integración",
                keywords: &["test", "phpunit"],
            },
        ],
        merge: "## ✅ Checklist antes de hacer merge
- [x] Código probado localmente
- [ ] Pruebas unitarias pasan (`php artisan test`)
- [ ] Pruebas de integración pasan
- [ ] Revisado por al menos 1 desarrollador",
    },
    Profile {
        category: ProjectCategory::Python,
        technical: &[
            TechnicalRule {
                label: "Cambios en lógica principal (.py)",
                keywords: &[".py"],
            },
            TechnicalRule {
                label: "Modificación de dependencias (requirements/pip)",
                keywords: &["requirements", ".toml"],
            },
            TechnicalRule {
                label: "Actualización de tests (pytest)",
                keywords: &["test"],
            },
        ],
        merge: "## ✅ Checklist antes de hacer merge
- [x] Código probado localmente
- [ ] Pruebas unitarias pasan (`pytest`)
- [ ] Linter verificado (`flake8` / `black`)
- [ ] Revisado por al menos 1 desarrollador",
    },
    Profile {
        category: ProjectCategory::Dolibarr,
        technical: &[
            TechnicalRule {
                label: "Cambios en descriptores de módulo o SQL",
                keywords: &["sql", "descriptor"],
            },
            TechnicalRule {
                label: "Modificación de lógica PHP/Core",
                keywords: &[".php"],
            },
            TechnicalRule {
                label: "Cambios en interfaz (CSS/JS)",
                keywords: &[".css", ".js"],
            },
        ],
        merge: "## ✅ Checklist antes de hacer merge
- [x] Código probado localmente
- [ ] Módulo activado y verificado en entorno de pruebas
- [ ] Scripts SQL ejecutados sin errores
- [ ] Revisado por al menos 1 desarrollador",
    },
    Profile {
        category: ProjectCategory::Go,
        technical: &[
            TechnicalRule {
                label: "Cambios en lógica principal (.go)",
                keywords: &[".go"],
            },
            TechnicalRule {
                label: "Modificación de dependencias (go.mod / go.sum)",
                keywords: &["go.mod", "go.sum"],
            },
            TechnicalRule {
                label: "Actualización de tests (go test)",
                keywords: &["_test.go"],
            },
        ],
        merge: "## ✅ Checklist antes de hacer merge
- [x] Código probado localmente
- [ ] Tests pasan (`go test ./...`)
- [ ] Linter verificado (`golangci-lint`)
- [ ] Revisado por al menos 1 desarrollador",
    },
    Profile {
        category: ProjectCategory::Node,
        technical: &[
            TechnicalRule {
                label: "Cambios en lógica principal (.js/.ts)",
                keywords: &[".js", ".ts", ".jsx", ".tsx"],
            },
            TechnicalRule {
                label: "Modificación de dependencias (package.json)",
                keywords: &["package.json"],
            },
            TechnicalRule {
                label: "Actualización de tests",
                keywords: &["test", "spec"],
            },
        ],
        merge: "## ✅ Checklist antes de hacer merge
- [x] Código probado localmente
- [ ] Tests pasan (`npm test`)
- [ ] Linter verificado (`eslint`)
- [ ] Revisado por al menos 1 desarrollador",
    },
];

/// Single item used for categories without a technical profile.
const GENERIC_TECHNICAL: &str = "Revisión manual de cambios genéricos";

const GENERIC_MERGE: &str = "## ✅ Checklist antes de hacer merge
- [x] Código probado localmente
- [ ] Pruebas manuales completadas
- [ ] Documentación actualizada
- [ ] Revisado por al menos 1 desarrollador";

fn profile(category: ProjectCategory) -> Option<&'static Profile> {
    PROFILES.iter().find(|p| p.category == category)
}

// ---------------------------------------------------------------------------
// ChecklistItem
// ---------------------------------------------------------------------------

/// One rendered checkbox line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistItem {
    pub label: &'static str,
    pub completed: bool,
}

impl std::fmt::Display for ChecklistItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mark = if self.completed { 'x' } else { ' ' };
        write!(f, "- [{mark}] {}", self.label)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Technical checklist items for `category`, auto-ticked against `stats`.
///
/// An item is completed when any of its keywords occurs in `stats`
/// (case-insensitive substring match).
pub fn technical_items(category: ProjectCategory, stats: &str) -> Vec<ChecklistItem> {
    let Some(profile) = profile(category) else {
        return vec![ChecklistItem {
            label: GENERIC_TECHNICAL,
            completed: false,
        }];
    };

    let haystack = stats.to_lowercase();
    let items: Vec<ChecklistItem> = profile
        .technical
        .iter()
        .map(|rule| ChecklistItem {
            label: rule.label,
            completed: rule.keywords.iter().any(|k| haystack.contains(k)),
        })
        .collect();

    debug!(
        %category,
        checked = items.iter().filter(|i| i.completed).count(),
        total = items.len(),
        "technical checklist built"
    );

    items
}

/// Technical checklist rendered as Markdown task lines.
pub fn technical(category: ProjectCategory, stats: &str) -> String {
    technical_items(category, stats)
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// The fixed merge-readiness checklist for `category`.
pub fn merge(category: ProjectCategory) -> &'static str {
    profile(category).map_or(GENERIC_MERGE, |p| p.merge)
}
