use crate::{Db, Entity, Result, SaveOptions};

/// A plain value type convertible to and from an entity.
pub trait TransferObject: Sized {
    /// Builds an entity, unsaved unless the object carries a primary key.
    fn to_entity(&self, db: &Db) -> Result<Entity>;

    fn from_entity(entity: &Entity) -> Result<Self>;
}

impl Db {
    /// Converts `dto`, saves the resulting entity and returns it.
    pub fn save_dto<D: TransferObject>(&self, dto: &D, options: &SaveOptions) -> Result<Entity> {
        let entity = dto.to_entity(self)?;
        self.save(&entity, options)?;
        Ok(entity)
    }

    pub fn save_all_dtos<D: TransferObject>(
        &self,
        dtos: &[D],
        options: &SaveOptions,
    ) -> Result<Vec<Entity>> {
        let entities = dtos
            .iter()
            .map(|dto| dto.to_entity(self))
            .collect::<Result<Vec<_>>>()?;

        self.save_all(&entities, options)?;
        Ok(entities)
    }
}
