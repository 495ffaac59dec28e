//! Plugin composition
//!
//! Per capability category, the plugins applying to a set of declarations
//! are gathered in a fixed order and folded into one [`Composite`]:
//!
//! 1. system plugins implied by annotations
//! 2. context-wide base plugins, in configuration order
//! 3. document plugins
//! 4. per-type plugins, in declaration order
//! 5. property plugins (reference category only)
//!
//! [`Composite`]: crate::plugin::Composite

use std::sync::Arc;

use super::GenerationContext;
use crate::plugin::builtin::{BOX, MAKE_ABSTRACT, RENAME, RENAME_IMPLEMENTATION};
use crate::plugin::PluginCategory;
use crate::schema::{Annotations, PluginDef, TypeDeclaration};

/// System plugins implied by a set of annotations.
///
/// Each flag is inspected independently; a directive implied by several
/// declarations is requested once.
pub fn system_plugins(annotations: &[&Annotations]) -> Vec<PluginDef> {
    let mut defs: Vec<PluginDef> = Vec::new();
    let mut push = |def: PluginDef| {
        if !defs.contains(&def) {
            defs.push(def);
        }
    };

    for a in annotations {
        if let Some(name) = &a.class_name {
            push(PluginDef::new(RENAME, vec![name.clone()]));
        }
        if let Some(name) = &a.implementation_class_name {
            push(PluginDef::new(RENAME_IMPLEMENTATION, vec![name.clone()]));
        }
        if !a.use_primitive {
            push(PluginDef::bare(BOX));
        }
        if !a.is_abstract {
            push(PluginDef::bare(MAKE_ABSTRACT));
        }
    }
    defs
}

impl GenerationContext {
    /// The composite of category `P` for `decls`
    pub fn plugins_for<P>(&self, decls: &[&TypeDeclaration]) -> Arc<P>
    where
        P: PluginCategory + ?Sized,
    {
        self.compose::<P>(decls, &[])
    }

    /// Like [`plugins_for`](Self::plugins_for), with `extra` directives
    /// appended after the per-type ones
    pub fn compose<P>(&self, decls: &[&TypeDeclaration], extra: &[PluginDef]) -> Arc<P>
    where
        P: PluginCategory + ?Sized,
    {
        let mut members: Vec<Arc<P>> = Vec::new();

        let annotations: Vec<&Annotations> = decls.iter().map(|d| &d.annotations).collect();
        for def in system_plugins(&annotations) {
            // Implied directives without a factory are expected
            if let Some(found) = self.registry.lookup::<P>(&def.name, &def.arguments) {
                members.extend(found);
            }
        }

        for id in &self.base_plugins {
            self.request(&mut members, id, &[]);
        }
        for def in &self.document.plugins {
            self.request(&mut members, &def.name, &def.arguments);
        }
        for decl in decls {
            for def in &decl.annotations.plugins {
                self.request(&mut members, &def.name, &def.arguments);
            }
        }
        for def in extra {
            self.request(&mut members, &def.name, &def.arguments);
        }

        tracing::trace!(
            category = %P::CATEGORY,
            types = ?decls.iter().map(|d| d.name.as_str()).collect::<Vec<_>>(),
            members = members.len(),
            "Composed plugins"
        );
        P::composite(members)
    }

    fn request<P>(&self, members: &mut Vec<Arc<P>>, name: &str, arguments: &[String])
    where
        P: PluginCategory + ?Sized,
    {
        match self.registry.lookup::<P>(name, arguments) {
            Some(found) => members.extend(found),
            None => {
                self.plugin_misses.lock().insert(name.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_imply_box_and_make_abstract() {
        let a = Annotations::default();
        let names: Vec<String> = system_plugins(&[&a]).into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec![BOX, MAKE_ABSTRACT]);
    }

    #[test]
    fn test_overrides_imply_renames() {
        let a = Annotations {
            class_name: Some("Widget".into()),
            implementation_class_name: Some("WidgetStruct".into()),
            use_primitive: true,
            is_abstract: true,
            plugins: vec![],
        };
        assert_eq!(
            system_plugins(&[&a]),
            vec![
                PluginDef::new(RENAME, vec!["Widget".into()]),
                PluginDef::new(RENAME_IMPLEMENTATION, vec!["WidgetStruct".into()]),
            ]
        );
    }

    #[test]
    fn test_shared_implied_plugins_requested_once() {
        let a = Annotations::default();
        let b = Annotations::default();
        assert_eq!(system_plugins(&[&a, &b]).len(), 2);
    }
}
