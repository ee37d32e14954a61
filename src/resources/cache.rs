//! Path-keyed registry of the textures one import has seen.

use std::{
    collections::{HashMap, hash_map::Entry},
    path::{Path, PathBuf},
    rc::Rc,
};

use crate::data_structures::texture::{TextureHandle, TextureResource, TextureRole};

/**
 * One [`TextureResource`] per resolved path.
 *
 * The importer owns the cache exclusively while it walks a scene and is the only one that
 * inserts; afterwards the cache moves into the [`crate::data_structures::model::Model`] and
 * meshes only hold shared references. Iteration follows first-request order.
 */
#[derive(Debug, Default)]
pub struct TextureCache {
    index: HashMap<PathBuf, usize>,
    textures: Vec<Rc<TextureResource>>,
    requests: usize,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<&Rc<TextureResource>> {
        self.index.get(path).map(|&idx| &self.textures[idx])
    }

    /// Returns the resource for `path`, creating it with `create` on the first request.
    ///
    /// Lookup and insert happen in one step: `create` only runs on a miss and nothing else
    /// can insert the same path in between. An `Err` from `create` leaves the cache
    /// unchanged.
    pub fn get_or_insert_with<E>(
        &mut self,
        path: PathBuf,
        role: TextureRole,
        create: impl FnOnce(&Path, TextureRole) -> Result<Option<TextureHandle>, E>,
    ) -> Result<Rc<TextureResource>, E> {
        self.requests += 1;
        match self.index.entry(path) {
            Entry::Occupied(entry) => Ok(Rc::clone(&self.textures[*entry.get()])),
            Entry::Vacant(entry) => {
                let handle = create(entry.key(), role)?;
                let resource = Rc::new(TextureResource::new(entry.key().clone(), role, handle));
                entry.insert(self.textures.len());
                self.textures.push(Rc::clone(&resource));
                Ok(resource)
            }
        }
    }

    /// Number of distinct paths.
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// How many times a texture was asked for, hits included.
    pub fn requests(&self) -> usize {
        self.requests
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<TextureResource>> {
        self.textures.iter()
    }

    /// Destroys every GPU image. Meshes still holding a reference keep a path but no
    /// usable texture.
    pub fn release(self) {
        for texture in &self.textures {
            texture.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_gpu(_: &Path, _: TextureRole) -> Result<Option<TextureHandle>, ()> {
        Ok(None)
    }

    #[test]
    fn same_path_is_created_once() {
        let mut cache = TextureCache::new();
        let mut created = 0;
        let mut request = |cache: &mut TextureCache, role| {
            cache
                .get_or_insert_with(PathBuf::from("a/wood.png"), role, |_, _| {
                    created += 1;
                    Ok::<_, ()>(None)
                })
                .unwrap()
        };
        let first = request(&mut cache, TextureRole::Diffuse);
        let second = request(&mut cache, TextureRole::Specular);

        assert!(Rc::ptr_eq(&first, &second));
        // the first request decides the role
        assert_eq!(second.role(), TextureRole::Diffuse);
        assert_eq!(created, 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.requests(), 2);
    }

    #[test]
    fn failed_creation_inserts_nothing() {
        let mut cache = TextureCache::new();
        let result =
            cache.get_or_insert_with(PathBuf::from("broken.png"), TextureRole::Diffuse, |_, _| {
                Err("corrupt")
            });
        assert_eq!(result.unwrap_err(), "corrupt");
        assert!(cache.is_empty());
        assert!(cache.get(Path::new("broken.png")).is_none());
    }

    #[test]
    fn iteration_follows_first_request() {
        let mut cache = TextureCache::new();
        for name in ["b.png", "a.png", "b.png", "c.png"] {
            cache
                .get_or_insert_with(PathBuf::from(name), TextureRole::Diffuse, no_gpu)
                .unwrap();
        }
        let paths: Vec<_> = cache.iter().map(|t| t.path().to_path_buf()).collect();
        assert_eq!(
            paths,
            [
                PathBuf::from("b.png"),
                PathBuf::from("a.png"),
                PathBuf::from("c.png")
            ]
        );
        assert!(!cache.get(Path::new("a.png")).unwrap().is_resident());
    }
}
